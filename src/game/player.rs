use serde::{Deserialize, Serialize};

pub type PlayerId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Display colour, 0-255 per channel
    pub rgb: (u8, u8, u8),
}

impl Player {
    pub fn new(id: PlayerId, name: &str, rgb: (u8, u8, u8)) -> Self {
        Self {
            id,
            name: name.to_string(),
            rgb,
        }
    }
}

/// The fixed, ordered pair of players. Turn order cycles through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    first: Player,
    second: Player,
}

impl Players {
    /// Ids must differ; scenario validation checks this before calling.
    pub(crate) fn new(first: Player, second: Player) -> Self {
        Self { first, second }
    }

    /// The player who opens every round
    pub fn first(&self) -> &Player {
        &self.first
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// The player whose turn follows `id`'s, wrapping around.
    pub fn next_after(&self, id: PlayerId) -> Option<&Player> {
        if id == self.first.id {
            Some(&self.second)
        } else if id == self.second.id {
            Some(&self.first)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        [&self.first, &self.second].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_order_wraps() {
        let players = Players::new(
            Player::new(1, "Hero", (0, 0, 255)),
            Player::new(2, "Villain", (255, 0, 0)),
        );

        assert_eq!(players.first().id, 1);
        assert_eq!(players.next_after(1).map(|p| p.id), Some(2));
        assert_eq!(players.next_after(2).map(|p| p.id), Some(1));
        assert_eq!(players.next_after(3), None);
        assert_eq!(players.get(2).map(|p| p.name.as_str()), Some("Villain"));
    }
}
