use serde::{Deserialize, Serialize};

/// Display name of the synthetic client that stands in for the relay itself.
pub const SERVER_NAME: &str = "Larry";

/// Avatar advertised for the relay's own client record.
pub const SERVER_PICTURE_URL: &str = "https://lh3.googleusercontent.com/-Y86IN-vEObo/AAAAAAAAAAI/AAAAAAADO1I/QzjOGHq5kNQ/photo.jpg?sz=50";

const SERVER_ADDRESS_DOMAIN: &str = "gcm.googleapis.com";

/// A peer known to the relay.
///
/// `registration_token` is the opaque delivery address the push backend uses
/// to reach the installation; the directory is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub registration_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub profile_picture_url: String,
}

impl Client {
    pub fn new(
        name: impl Into<String>,
        registration_token: impl Into<String>,
        profile_picture_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            registration_token: registration_token.into(),
            profile_picture_url: profile_picture_url.into(),
        }
    }

    /// The relay's own record, reachable at [`server_address`].
    pub fn server_identity(sender_id: &str) -> Self {
        Self::new(SERVER_NAME, server_address(sender_id), SERVER_PICTURE_URL)
    }

    /// Name shown to other clients; falls back to the address for nameless records.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.registration_token
        } else {
            &self.name
        }
    }
}

/// Address under which the push backend delivers messages to the relay itself.
pub fn server_address(sender_id: &str) -> String {
    format!("{sender_id}@{SERVER_ADDRESS_DOMAIN}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_address_is_derived_from_sender_id() {
        assert_eq!(server_address("1234"), "1234@gcm.googleapis.com");

        let identity = Client::server_identity("1234");
        assert_eq!(identity.name, "Larry");
        assert_eq!(identity.registration_token, "1234@gcm.googleapis.com");
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let client = Client::new("", "token-a", "");
        let encoded = serde_json::to_value(&client).expect("encode client");
        assert_eq!(encoded, serde_json::json!({ "registration_token": "token-a" }));
        assert_eq!(client.display_name(), "token-a");
    }
}
