// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! NS3940-style room colour coding
//!
//! A room is bucketed by the first category whose keyword occurs in its
//! lower-cased name. Categories are checked in declaration order, so wet
//! rooms win over the generic "rom" endings of compound names.

use super::paint::Color;

/// Fill for rooms no keyword matches
pub const NEUTRAL: Color = Color::rgb(232, 232, 228);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoomCategory {
    WetRoom,
    Kitchen,
    Meeting,
    Office,
    Corridor,
    Stair,
    Technical,
    Storage,
    Bedroom,
    Living,
}

const CATEGORIES: &[(RoomCategory, &[&str])] = &[
    (
        RoomCategory::WetRoom,
        &["bad", "wc", "toalett", "dusj", "vaskerom", "bath", "toilet", "shower"],
    ),
    (RoomCategory::Kitchen, &["kjøkken", "kitchen", "pantry", "kantine"]),
    (RoomCategory::Meeting, &["møte", "meeting", "konferanse", "conference"]),
    (RoomCategory::Office, &["kontor", "office", "arbeidsrom"]),
    (RoomCategory::Corridor, &["korridor", "gang", "corridor", "hall", "entré", "vindfang"]),
    (RoomCategory::Stair, &["trapp", "stair", "heis", "elevator"]),
    (RoomCategory::Technical, &["teknisk", "tekn", "technical", "server", "sjakt"]),
    (RoomCategory::Storage, &["lager", "bod", "storage", "arkiv"]),
    (RoomCategory::Bedroom, &["soverom", "bedroom"]),
    (RoomCategory::Living, &["stue", "living", "opphold"]),
];

impl RoomCategory {
    /// Category for a room name, `None` if nothing matches
    pub fn classify(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        CATEGORIES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(category, _)| *category)
    }

    pub fn color(&self) -> Color {
        match self {
            RoomCategory::WetRoom => Color::rgb(164, 212, 236),
            RoomCategory::Kitchen => Color::rgb(250, 214, 165),
            RoomCategory::Meeting => Color::rgb(196, 178, 226),
            RoomCategory::Office => Color::rgb(190, 225, 180),
            RoomCategory::Corridor => Color::rgb(245, 240, 190),
            RoomCategory::Stair => Color::rgb(210, 200, 190),
            RoomCategory::Technical => Color::rgb(240, 170, 160),
            RoomCategory::Storage => Color::rgb(205, 205, 205),
            RoomCategory::Bedroom => Color::rgb(230, 200, 215),
            RoomCategory::Living => Color::rgb(255, 230, 200),
        }
    }
}

/// Palette colour for a room name, [`NEUTRAL`] when unclassified
pub fn room_color(name: &str) -> Color {
    RoomCategory::classify(name).map_or(NEUTRAL, |c| c.color())
}
