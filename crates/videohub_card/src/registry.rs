//! Card registration metadata for the host's card picker.

use linkme::distributed_slice;

/// Static description of a card type, offered by the host when adding a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardRegistration {
    /// Registry type id, without the host's `custom:` prefix
    pub type_id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Every card type linked into the binary.
#[distributed_slice]
pub static CARD_REGISTRY: [CardRegistration];

#[distributed_slice(CARD_REGISTRY)]
static VIDEOHUB_CARD: CardRegistration = CardRegistration {
    type_id: "blackmagic-videohub-card",
    name: "Blackmagic Videohub Card",
    description: "Quick routing UI for Blackmagic Videohub select entities",
};

/// The routing card's own registration.
pub fn registration() -> &'static CardRegistration {
    &VIDEOHUB_CARD
}

/// Look up a card type. Accepts both `blackmagic-videohub-card` and the
/// `custom:blackmagic-videohub-card` form used in card configurations.
pub fn find_card(type_id: &str) -> Option<&'static CardRegistration> {
    let type_id = type_id.strip_prefix("custom:").unwrap_or(type_id);
    CARD_REGISTRY.iter().find(|card| card.type_id == type_id)
}
