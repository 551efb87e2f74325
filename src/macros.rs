/// Declare the attribute schema of a resource type and generate its accessors.
///
/// The target type must hold its attribute storage in a field named `state`
/// of type [`crate::data::Mutable`]. Required attributes get getters returning
/// the value directly, optional attributes get getters returning `Option`, and
/// only attributes listed under `mutable` get setters. A mutable name that is
/// not declared as required or optional fails to compile.
macro_rules! resource_attributes {
    (
        $resource:ident {
            required { $( $req:ident : $req_ty:ty ),* $(,)? }
            optional { $( $opt:ident : $opt_ty:ty ),* $(,)? }
            mutable { $( $muta:ident => $setter:ident ),* $(,)? }
        }
    ) => {
        impl $resource {
            pub const SCHEMA: $crate::data::Schema = $crate::data::Schema {
                required: &[$( stringify!($req) ),*],
                optional: &[$( stringify!($opt) ),*],
                mutable: &[$( stringify!($muta) ),*],
            };

            $(
                pub fn $req(&self) -> $req_ty {
                    $crate::data::FromField::from_field(self.state.get(stringify!($req)))
                        .unwrap_or_default()
                }
            )*

            $(
                pub fn $opt(&self) -> Option<$opt_ty> {
                    $crate::data::FromField::from_field(self.state.get(stringify!($opt)))
                }
            )*

            $(
                pub fn $setter(&mut self, value: impl Into<$crate::data::Field>) {
                    self.state.set(stringify!($muta), value.into());
                }
            )*

            /// Raw attribute access, including unset values.
            pub fn attribute(&self, name: &str) -> &$crate::data::Field {
                self.state.get(name)
            }
        }

        const _: () = assert!(
            $resource::SCHEMA.is_consistent(),
            concat!(
                "mutable attributes of ",
                stringify!($resource),
                " must be declared as required or optional"
            )
        );
    };
}
