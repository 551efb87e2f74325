use crate::{
    boxes::{BoxError, VagrantBox},
    client::Client,
    data::{CleanFilter, DataError, Field, Mutable},
    error::Result,
};
use serde_json::Value;
use tracing::debug;

/// A user or organization namespace owning boxes.
///
/// Organizations are never created through the API, so an instance always
/// refers to one that exists remotely.
#[derive(Debug, Clone)]
pub struct Organization {
    client: Client,
    state: Mutable,
    boxes: Vec<VagrantBox>,
}

resource_attributes! {
    Organization {
        required { username: &str }
        optional {
            avatar_url: &str,
            profile_html: &str,
            profile_markdown: &str,
        }
        mutable {}
    }
}

impl Organization {
    /// Organization handle for a known username, with no boxes loaded.
    pub fn new(client: Client, username: &str) -> Result<Organization, DataError> {
        Ok(Organization {
            client,
            state: Mutable::new(Self::SCHEMA, [("username", Field::from(username))])?,
            boxes: Vec::new(),
        })
    }

    pub fn load(client: Client, data: &Value) -> Result<Organization, DataError> {
        let state = Mutable::load(Self::SCHEMA, data)?;
        let mut organization = Organization {
            client,
            state,
            boxes: Vec::new(),
        };
        if let Some(Value::Array(items)) = data.get("boxes") {
            let username = organization.username().to_string();
            organization.boxes = items
                .iter()
                .map(|item| VagrantBox::load(organization.client.clone(), &username, item))
                .collect::<Result<Vec<_>, _>>()?;
        }
        Ok(organization)
    }

    pub async fn get(client: Client, name: &str) -> Result<Organization> {
        debug!("Fetching organization {}", name);
        let data = client.organization_get(name).await?;
        Ok(Organization::load(client, &data)?)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn boxes(&self) -> &[VagrantBox] {
        &self.boxes
    }

    pub fn get_box(&self, name: &str) -> Option<&VagrantBox> {
        self.boxes.iter().find(|b| b.name() == name)
    }

    pub fn get_box_mut(&mut self, name: &str) -> Option<&mut VagrantBox> {
        self.boxes.iter_mut().find(|b| b.name() == name)
    }

    /// Track a box that came from elsewhere, such as a search result.
    pub(crate) fn adopt_box(&mut self, vagrant_box: VagrantBox) {
        if self.get_box(vagrant_box.name()).is_none() {
            self.boxes.push(vagrant_box);
        }
    }

    pub fn add_box(&mut self, name: &str) -> Result<&mut VagrantBox> {
        if self.get_box(name).is_some() {
            return Err(BoxError::BoxExists {
                name: name.to_string(),
            }
            .into());
        }
        let vagrant_box = VagrantBox::new(self.client.clone(), self.username(), name)?;
        self.boxes.push(vagrant_box);
        let index = self.boxes.len() - 1;
        Ok(&mut self.boxes[index])
    }

    /// Delete a box and drop it from this organization if it existed remotely.
    pub async fn delete_box(&mut self, name: &str) -> Result<bool> {
        let index = match self.boxes.iter().position(|b| b.name() == name) {
            Some(index) => index,
            None => return Ok(false),
        };
        let deleted = self.boxes[index].delete().await?;
        if deleted {
            self.boxes.remove(index);
        }
        Ok(deleted)
    }

    pub fn exist(&self) -> bool {
        true
    }

    pub fn dirty(&self) -> bool {
        self.state.dirty()
    }

    pub fn dirty_key(&self, key: &str) -> bool {
        self.state.dirty_key(key)
    }

    pub fn dirty_deep(&self) -> bool {
        self.dirty() || self.boxes.iter().any(VagrantBox::dirty_deep)
    }

    pub fn clean(&mut self, data: &Value, filter: CleanFilter<'_>) -> Result<(), DataError> {
        self.state.clean(data, filter)
    }

    /// Save every box that has changes.
    pub async fn save(&mut self) -> Result<()> {
        for vagrant_box in &mut self.boxes {
            vagrant_box.save().await?;
        }
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.state.to_map();
        map.insert(
            "boxes".to_string(),
            Value::Array(self.boxes.iter().map(VagrantBox::to_value).collect()),
        );
        Value::Object(map)
    }
}
