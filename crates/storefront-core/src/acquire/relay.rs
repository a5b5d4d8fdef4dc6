use anyhow::{bail, Result};
use url::form_urlencoded;

const JSON_PREFIX: &str = "json:";
const URL_PLACEHOLDER: &str = "{url}";
const JSON_WRAPPING_HOSTS: &[&str] = &["allorigins.win"];

/// A CORS relay: a URL template with a `{url}` placeholder for the
/// percent-encoded target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub name: String,
    pub template: String,
    /// The relay answers with a JSON object that carries the body.
    pub json_wrapped: bool,
}

impl Relay {
    pub fn new(name: impl Into<String>, template: impl Into<String>, json_wrapped: bool) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            json_wrapped,
        }
    }

    pub fn url_for(&self, target: &str) -> String {
        self.template
            .replace(URL_PLACEHOLDER, &encode_component(target))
    }

    /// Flagged JSON-wrapped, or a relay host known to wrap responses.
    pub fn expects_json(&self, url: &str) -> bool {
        self.json_wrapped || JSON_WRAPPING_HOSTS.iter().any(|host| url.contains(host))
    }
}

/// The public relays, in the order they are tried.
pub fn default_relays() -> Vec<Relay> {
    vec![
        Relay::new("allorigins", "https://api.allorigins.win/get?url={url}", true),
        Relay::new("corsproxy", "https://corsproxy.io/?{url}", false),
        Relay::new(
            "codetabs",
            "https://api.codetabs.com/v1/proxy?quest={url}",
            false,
        ),
    ]
}

/// Parse a `;`-separated relay list. A `json:` prefix marks a JSON-wrapped
/// relay; every template must contain `{url}`.
pub fn parse_relays(raw: &str) -> Result<Vec<Relay>> {
    let mut relays = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (template, json_wrapped) = match entry.strip_prefix(JSON_PREFIX) {
            Some(rest) => (rest.trim(), true),
            None => (entry, false),
        };
        if !template.contains(URL_PLACEHOLDER) {
            bail!("relay template {template:?} has no {{url}} placeholder");
        }
        relays.push(Relay::new(relay_name(template), template, json_wrapped));
    }
    if relays.is_empty() {
        bail!("relay list is empty");
    }
    Ok(relays)
}

fn relay_name(template: &str) -> String {
    url::Url::parse(&template.replace(URL_PLACEHOLDER, ""))
        .ok()
        .and_then(|parsed| {
            let host = parsed.host_str()?.to_string();
            Some(match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host,
            })
        })
        .unwrap_or_else(|| template.to_string())
}

pub(crate) fn encode_component(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
