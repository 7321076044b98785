//! `find_nearest_store`: match a city or district against the store table.

use helpdesk_rs::tools::core::{Tool, ToolArgs, ToolFuture, str_arg};
use helpdesk_rs::tools::declaration::{ParamType, ToolDeclaration};
use helpdesk_rs::tools::result::ToolResult;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::fold_text;

/// Cities with a store, in display form.
pub const SERVED_CITIES: [&str; 5] = ["İstanbul", "Ankara", "İzmir", "Bursa", "Antalya"];

const DISTANCE: &str = "Yaklaşık 2.5 km";
const NEEDS_LOCATION_MESSAGE: &str =
    "Konum bilgisi alınamadı. Lütfen bulunduğunuz şehir veya semti belirtin.";

/// Phrases that mean "where I am" rather than naming a place. Matched as
/// substrings of the normalized location, so "my current location" and
/// "bulunduğum konum" count too.
const LOCATION_SENTINELS: &[&str] = &["current location", "my location", "konum"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Store {
    pub name: &'static str,
    pub address: &'static str,
    pub phone: &'static str,
    pub working_hours: &'static str,
}

/// Folded city key → store. Checked in this order.
const STORES: &[(&str, Store)] = &[
    (
        "istanbul",
        Store {
            name: "İstanbul Merkez Mağaza",
            address: "Bağdat Caddesi No:123, Kadıköy",
            phone: "0212 555 1234",
            working_hours: "09:00-22:00",
        },
    ),
    (
        "ankara",
        Store {
            name: "Ankara Kızılay Mağazası",
            address: "Atatürk Bulvarı No:456, Kızılay",
            phone: "0312 555 5678",
            working_hours: "10:00-21:00",
        },
    ),
    (
        "izmir",
        Store {
            name: "İzmir Karşıyaka Mağazası",
            address: "Cemal Gürsel Cad. No:789, Karşıyaka",
            phone: "0232 555 9012",
            working_hours: "10:00-22:00",
        },
    ),
    (
        "bursa",
        Store {
            name: "Bursa Nilüfer Mağazası",
            address: "FSM Bulvarı No:101, Nilüfer",
            phone: "0224 555 3456",
            working_hours: "10:00-21:00",
        },
    ),
    (
        "antalya",
        Store {
            name: "Antalya Merkez Mağazası",
            address: "Konyaaltı Cad. No:202, Merkez",
            phone: "0242 555 7890",
            working_hours: "09:00-22:00",
        },
    ),
];

/// How a location argument was understood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreLookup {
    /// No usable place name; ask the user for one.
    NeedsLocation,
    Found(&'static Store),
    NoMatch,
}

/// Folded location with punctuation turned into spaces.
fn location_key(location: &str) -> String {
    let spaced: String = fold_text(location)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Match `location` against the store table.
///
/// A store matches when its city key occurs in the normalized location or
/// the normalized location occurs in the key. A location that names no city
/// but refers to the user's own position needs a real place name.
pub fn lookup_store(location: Option<&str>) -> StoreLookup {
    let key = location.map(location_key).unwrap_or_default();
    if key.is_empty() {
        return StoreLookup::NeedsLocation;
    }
    if let Some((_, store)) = STORES
        .iter()
        .find(|(city, _)| key.contains(city) || city.contains(key.as_str()))
    {
        return StoreLookup::Found(store);
    }
    if LOCATION_SENTINELS.iter().any(|s| key.contains(s)) {
        StoreLookup::NeedsLocation
    } else {
        StoreLookup::NoMatch
    }
}

/// Nearest-store search.
pub struct FindNearestStore {
    decl: ToolDeclaration,
}

impl FindNearestStore {
    pub fn new() -> Self {
        Self {
            decl: ToolDeclaration::builder(super::FIND_NEAREST_STORE)
                .description(
                    "Verilen konuma en yakın mağazayı bulur. Konum bir şehir veya \
                     semt adı olmalıdır; kullanıcı konum vermediyse boş bırak.",
                )
                .optional(
                    "location",
                    ParamType::String,
                    "Kullanıcının bulunduğu şehir veya semt, örn. \"Kadıköy\" veya \"Ankara\"",
                )
                .build(),
        }
    }
}

impl Default for FindNearestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for FindNearestStore {
    fn declaration(&self) -> &ToolDeclaration {
        &self.decl
    }

    fn execute(&self, args: ToolArgs) -> ToolFuture<'_> {
        Box::pin(async move {
            let location = str_arg(&args, "location").map(str::trim);

            match lookup_store(location) {
                StoreLookup::NeedsLocation => {
                    warn!("find_nearest_store: no usable location ({location:?})");
                    ToolResult::validation(NEEDS_LOCATION_MESSAGE).with_payload(json!({
                        "needs_location": true,
                        "stores_available": SERVED_CITIES,
                    }))
                }
                StoreLookup::Found(store) => {
                    info!("find_nearest_store({location:?}) -> {}", store.name);
                    ToolResult::ok(json!({
                        "store": store,
                        "distance": DISTANCE,
                    }))
                    .with_message(format!(
                        "Size en yakın mağazamız: {}, {}",
                        store.name, store.address
                    ))
                }
                StoreLookup::NoMatch => {
                    let location = location.unwrap_or_default();
                    info!("find_nearest_store({location:?}) -> no match");
                    ToolResult::not_found(format!(
                        "'{location}' konumunda mağaza bulunamadı. Hizmet verdiğimiz şehirler: {}",
                        SERVED_CITIES.join(", ")
                    ))
                    .with_payload(json!({ "stores_available": SERVED_CITIES }))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_rs::tools::core::ToolSet;
    use helpdesk_rs::tools::result::ToolErrorKind;

    fn found(location: &str) -> &'static str {
        match lookup_store(Some(location)) {
            StoreLookup::Found(store) => store.name,
            other => panic!("{location:?}: {other:?}"),
        }
    }

    #[test]
    fn turkish_spellings_match() {
        assert_eq!(found("İzmir"), "İzmir Karşıyaka Mağazası");
        assert_eq!(found("IZMIR"), "İzmir Karşıyaka Mağazası");
        assert_eq!(found("istanbul"), "İstanbul Merkez Mağaza");
        assert_eq!(found("İSTANBUL"), "İstanbul Merkez Mağaza");
        assert_eq!(found("Kadıköy, İstanbul"), "İstanbul Merkez Mağaza");
    }

    #[test]
    fn partial_name_matches_in_both_directions() {
        assert_eq!(found("Ankara Çankaya"), "Ankara Kızılay Mağazası");
        assert_eq!(found("antal"), "Antalya Merkez Mağazası");
    }

    #[test]
    fn sentinels_and_blanks_need_location() {
        for loc in [
            "current location",
            "My Location",
            "Konumum",
            "  ",
            "?",
            "mevcut konum",
            "my current location",
            "Current location.",
            "user's current location",
            "bulunduğum konum",
            "KONUMUM!",
        ] {
            assert_eq!(lookup_store(Some(loc)), StoreLookup::NeedsLocation, "{loc:?}");
        }
        assert_eq!(lookup_store(None), StoreLookup::NeedsLocation);
    }

    #[test]
    fn unknown_city() {
        assert_eq!(lookup_store(Some("Trabzon")), StoreLookup::NoMatch);
        assert_eq!(lookup_store(Some("Trabzon, Ortahisar.")), StoreLookup::NoMatch);
    }

    #[test]
    fn city_wins_over_location_phrase() {
        assert_eq!(found("Ankara'daki konumum"), "Ankara Kızılay Mağazası");
        assert_eq!(found("İzmir."), "İzmir Karşıyaka Mağazası");
    }

    #[tokio::test]
    async fn location_phrase_variant_gets_guidance() {
        let tools = ToolSet::new().with(FindNearestStore::new());
        let result = tools
            .invoke("find_nearest_store", json!({"location": "user's current location"}))
            .await;
        assert_eq!(result.error, Some(ToolErrorKind::Validation));
        assert_eq!(result.field("needs_location"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn guidance_payload() {
        let tools = ToolSet::new().with(FindNearestStore::new());
        let result = tools
            .invoke("find_nearest_store", json!({"location": "your current location"}))
            .await;
        assert!(!result.success);
        assert_eq!(result.field("needs_location"), Some(&json!(true)));
        assert_eq!(
            result.field("stores_available"),
            Some(&json!(["İstanbul", "Ankara", "İzmir", "Bursa", "Antalya"]))
        );
        assert!(result.field("store").is_none());
    }

    #[tokio::test]
    async fn match_payload() {
        let tools = ToolSet::new().with(FindNearestStore::new());
        let result = tools
            .invoke("find_nearest_store", json!({"location": "bursa"}))
            .await;
        assert!(result.success);
        assert_eq!(result.field("distance"), Some(&json!("Yaklaşık 2.5 km")));
        assert_eq!(result.payload["store"]["phone"], "0224 555 3456");
        assert_eq!(
            result.message.as_deref(),
            Some("Size en yakın mağazamız: Bursa Nilüfer Mağazası, FSM Bulvarı No:101, Nilüfer")
        );
    }

    #[tokio::test]
    async fn no_match_lists_cities() {
        let tools = ToolSet::new().with(FindNearestStore::new());
        let result = tools
            .invoke("find_nearest_store", json!({"location": "Trabzon"}))
            .await;
        assert_eq!(result.error, Some(ToolErrorKind::NotFound));
        assert!(result.message.unwrap().contains("İstanbul, Ankara, İzmir, Bursa, Antalya"));
    }
}
