use clap::ArgMatches;
use serde_json::{json, Value};
use tracing::debug;
use vagrant_cloud::{
    auth::{Auth, AuthError, ENV_ACCESS_TOKEN},
    boxes::{BoxRef, Provider, VagrantBox, Version, VersionRef},
    client::{Client, ProviderTarget, SearchParams},
    commands::{
        BoxTag, COMMAND_AUTH, COMMAND_BOX, COMMAND_CONFIG, COMMAND_CREATE, COMMAND_DELETE,
        COMMAND_GET, COMMAND_PATH, COMMAND_PROVIDER, COMMAND_RELEASE, COMMAND_REVOKE,
        COMMAND_SEARCH, COMMAND_SHOW, COMMAND_UPLOAD_URL, COMMAND_VALIDATE, COMMAND_VERSION,
        PARAMETER_ARCHITECTURE, PARAMETER_BOX, PARAMETER_CHECKSUM, PARAMETER_CHECKSUM_TYPE,
        PARAMETER_DEFAULT_ARCHITECTURE, PARAMETER_DESCRIPTION, PARAMETER_DIRECT,
        PARAMETER_LIMIT, PARAMETER_ORDER, PARAMETER_PAGE, PARAMETER_PRIVATE,
        PARAMETER_PROVIDER, PARAMETER_QUERY, PARAMETER_SHORT_DESCRIPTION, PARAMETER_SORT,
        PARAMETER_TOKEN, PARAMETER_URL, PARAMETER_VERSION,
    },
    configuration::Configuration,
    Account, Error, Result, Search,
};

fn extract_subcommand_name(sub_matches: &ArgMatches) -> String {
    match sub_matches.subcommand() {
        Some((name, _)) => name.to_string(),
        None => "unknown".to_string(),
    }
}

fn unsupported(sub_matches: &ArgMatches) -> Error {
    Error::UnsupportedSubcommand(extract_subcommand_name(sub_matches))
}

fn required<'a, T: Clone + Send + Sync + 'static>(
    matches: &'a ArgMatches,
    name: &str,
) -> Result<&'a T> {
    matches
        .get_one::<T>(name)
        .ok_or_else(|| Error::MissingRequiredArgument(name.to_string()))
}

fn optional<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches.get_one::<String>(name).map(String::as_str)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_client(configuration: &Configuration, matches: &ArgMatches) -> Result<Client> {
    let auth = Auth::new(matches.get_one::<String>(PARAMETER_TOKEN).cloned())?;
    Ok(configuration.client_builder().auth(auth).build()?)
}

async fn load_version(client: &Client, tag: &BoxTag, version: &str) -> Result<Version> {
    let data = client
        .box_version_get(&tag.username, &tag.name, version)
        .await?;
    let box_ref = BoxRef {
        username: tag.username.clone(),
        name: tag.name.clone(),
    };
    Ok(Version::load(client.clone(), box_ref, &data)?)
}

async fn load_provider(client: &Client, matches: &ArgMatches) -> Result<Provider> {
    let tag = required::<BoxTag>(matches, PARAMETER_BOX)?;
    let version = required::<String>(matches, PARAMETER_VERSION)?;
    let name = required::<String>(matches, PARAMETER_PROVIDER)?;
    let target = ProviderTarget {
        username: &tag.username,
        name: &tag.name,
        version,
        provider: name,
        architecture: optional(matches, PARAMETER_ARCHITECTURE),
    };
    let data = client.box_version_provider_get(target).await?;
    let version_ref = VersionRef {
        username: tag.username.clone(),
        box_name: tag.name.clone(),
        version: version.clone(),
    };
    Ok(Provider::load(client.clone(), version_ref, &data)?)
}

async fn execute_box(client: Client, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some((COMMAND_GET, sub_matches)) => {
            let tag = required::<BoxTag>(sub_matches, PARAMETER_BOX)?;
            let mut vagrant_box = VagrantBox::get(client, &tag.username, &tag.name).await?;
            vagrant_box.versions().await?;
            print_json(&vagrant_box.to_value())
        }
        Some((COMMAND_CREATE, sub_matches)) => {
            let tag = required::<BoxTag>(sub_matches, PARAMETER_BOX)?;
            let mut vagrant_box = VagrantBox::new(client, &tag.username, &tag.name)?;
            vagrant_box.set_short_description(optional(sub_matches, PARAMETER_SHORT_DESCRIPTION));
            vagrant_box.set_description(optional(sub_matches, PARAMETER_DESCRIPTION));
            if sub_matches.get_flag(PARAMETER_PRIVATE) {
                vagrant_box.set_private(true);
            }
            vagrant_box.save().await?;
            print_json(&vagrant_box.to_value())
        }
        Some((COMMAND_DELETE, sub_matches)) => {
            let tag = required::<BoxTag>(sub_matches, PARAMETER_BOX)?;
            let vagrant_box = VagrantBox::get(client, &tag.username, &tag.name).await?;
            let deleted = vagrant_box.delete().await?;
            print_json(&json!({ "tag": tag_string(tag), "deleted": deleted }))
        }
        _ => Err(unsupported(matches)),
    }
}

fn tag_string(tag: &BoxTag) -> String {
    format!("{}/{}", tag.username, tag.name)
}

async fn execute_version(client: Client, matches: &ArgMatches) -> Result<()> {
    let (name, sub_matches) = matches.subcommand().ok_or_else(|| unsupported(matches))?;
    let tag = required::<BoxTag>(sub_matches, PARAMETER_BOX)?;
    let version = required::<String>(sub_matches, PARAMETER_VERSION)?;

    match name {
        COMMAND_CREATE => {
            let mut vagrant_box = VagrantBox::get(client, &tag.username, &tag.name).await?;
            let created = vagrant_box.add_version(version).await?;
            created.set_description(optional(sub_matches, PARAMETER_DESCRIPTION));
            vagrant_box.save().await?;
            let created = vagrant_box
                .version(version)
                .map(Version::to_value)
                .unwrap_or(Value::Null);
            print_json(&created)
        }
        COMMAND_RELEASE => {
            let mut loaded = load_version(&client, tag, version).await?;
            loaded.release().await?;
            print_json(&loaded.to_value())
        }
        COMMAND_REVOKE => {
            let mut loaded = load_version(&client, tag, version).await?;
            loaded.revoke().await?;
            print_json(&loaded.to_value())
        }
        COMMAND_DELETE => {
            let loaded = load_version(&client, tag, version).await?;
            let deleted = loaded.delete().await?;
            print_json(&json!({
                "tag": tag_string(tag),
                "version": version,
                "deleted": deleted
            }))
        }
        _ => Err(unsupported(matches)),
    }
}

async fn execute_provider(client: Client, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some((COMMAND_CREATE, sub_matches)) => {
            let tag = required::<BoxTag>(sub_matches, PARAMETER_BOX)?;
            let version = required::<String>(sub_matches, PARAMETER_VERSION)?;
            let name = required::<String>(sub_matches, PARAMETER_PROVIDER)?;
            let architecture = optional(sub_matches, PARAMETER_ARCHITECTURE);

            let mut loaded = load_version(&client, tag, version).await?;
            let provider = loaded.add_provider(name, architecture)?;
            provider.set_url(optional(sub_matches, PARAMETER_URL));
            provider.set_checksum(optional(sub_matches, PARAMETER_CHECKSUM));
            provider.set_checksum_type(optional(sub_matches, PARAMETER_CHECKSUM_TYPE));
            if sub_matches.get_flag(PARAMETER_DEFAULT_ARCHITECTURE) {
                provider.set_default_architecture(true);
            }
            loaded.save().await?;
            let created = loaded
                .provider(name, architecture)
                .map(Provider::to_value)
                .unwrap_or(Value::Null);
            print_json(&created)
        }
        Some((COMMAND_DELETE, sub_matches)) => {
            let provider = load_provider(&client, sub_matches).await?;
            let deleted = provider.delete().await?;
            print_json(&json!({ "provider": provider.name(), "deleted": deleted }))
        }
        Some((COMMAND_UPLOAD_URL, sub_matches)) => {
            let provider = load_provider(&client, sub_matches).await?;
            let upload = provider
                .upload_url(sub_matches.get_flag(PARAMETER_DIRECT))
                .await?;
            print_json(&json!({
                "upload_url": upload.upload_url,
                "callback": upload.callback_url
            }))
        }
        _ => Err(unsupported(matches)),
    }
}

async fn execute_search(client: Client, matches: &ArgMatches) -> Result<()> {
    let params = SearchParams {
        query: matches.get_one::<String>(PARAMETER_QUERY).cloned(),
        provider: matches.get_one::<String>(PARAMETER_PROVIDER).cloned(),
        sort: matches.get_one::<String>(PARAMETER_SORT).cloned(),
        order: matches.get_one::<String>(PARAMETER_ORDER).cloned(),
        limit: matches.get_one::<u32>(PARAMETER_LIMIT).copied(),
        page: matches.get_one::<u32>(PARAMETER_PAGE).copied(),
    };
    let results = Search::new(client).search(params).await?;
    let boxes: Vec<Value> = results.boxes().iter().map(VagrantBox::to_value).collect();
    print_json(&json!({ "page": results.page(), "boxes": boxes }))
}

async fn execute_auth(client: Client, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some((COMMAND_VALIDATE, _)) => {
            if !client.auth().is_available() {
                return Err(AuthError::MissingConfiguration {
                    name: ENV_ACCESS_TOKEN.to_string(),
                }
                .into());
            }
            let account = Account::new(client).await?;
            print_json(&json!({ "valid": true, "username": account.username() }))
        }
        _ => Err(unsupported(matches)),
    }
}

fn execute_config(configuration: &Configuration, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some((COMMAND_PATH, _)) => {
            let path = Configuration::get_default_configuration_file_path()?;
            println!("{}", path.display());
            Ok(())
        }
        Some((COMMAND_SHOW, _)) => {
            configuration.write(std::io::stdout())?;
            Ok(())
        }
        _ => Err(unsupported(matches)),
    }
}

pub async fn execute_command(configuration: Configuration, commands: ArgMatches) -> Result<()> {
    let (name, sub_matches) = commands
        .subcommand()
        .ok_or_else(|| unsupported(&commands))?;
    debug!("Executing command {}", name);

    if name == COMMAND_CONFIG {
        return execute_config(&configuration, sub_matches);
    }

    let client = build_client(&configuration, &commands)?;
    match name {
        COMMAND_BOX => execute_box(client, sub_matches).await,
        COMMAND_VERSION => execute_version(client, sub_matches).await,
        COMMAND_PROVIDER => execute_provider(client, sub_matches).await,
        COMMAND_SEARCH => execute_search(client, sub_matches).await,
        COMMAND_AUTH => execute_auth(client, sub_matches).await,
        _ => Err(unsupported(&commands)),
    }
}
