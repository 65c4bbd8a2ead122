use crate::navigation::Direction;

/// Audio resource and spoken phrase for one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueAsset {
    pub locator: String,
    pub phrase: String,
}

impl CueAsset {
    pub fn new<L: Into<String>, P: Into<String>>(locator: L, phrase: P) -> Self {
        Self {
            locator: locator.into(),
            phrase: phrase.into(),
        }
    }
}

/// Fixed cue table indexed by direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueAssets {
    entries: [CueAsset; 3],
}

impl Default for CueAssets {
    fn default() -> Self {
        Self::new(
            CueAsset::new("audio/straight.mp3", "Go straight"),
            CueAsset::new("audio/left.mp3", "Turn left"),
            CueAsset::new("audio/right.mp3", "Turn right"),
        )
    }
}

impl CueAssets {
    pub fn new(straight: CueAsset, left: CueAsset, right: CueAsset) -> Self {
        Self {
            entries: [straight, left, right],
        }
    }

    pub fn get(&self, direction: Direction) -> &CueAsset {
        &self.entries[direction.index()]
    }

    pub fn locator(&self, direction: Direction) -> &str {
        &self.get(direction).locator
    }

    pub fn phrase(&self, direction: Direction) -> &str {
        &self.get(direction).phrase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_direction() {
        let assets = CueAssets::default();
        assert_eq!(assets.phrase(Direction::Straight), "Go straight");
        assert_eq!(assets.phrase(Direction::Left), "Turn left");
        assert_eq!(assets.locator(Direction::Right), "audio/right.mp3");
    }
}
