//! Tile sources: url templates and the keys identifying them in the cache.

use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use aerial_types::TileId;
use regex::Regex;

use crate::error::AerialError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)\{([xyz])\}").unwrap()
});

const DEFAULT_EXTENSION: &str = "tile";
const SOURCE_HASH_LEN: usize = 16;

/// Url of a tile service with `{z}`, `{x}` and `{y}` placeholders.
///
/// Placeholders are case-insensitive and can appear more than once.
///
/// ```
/// use aerial::source::UrlTemplate;
/// use aerial::TileId;
///
/// let template = UrlTemplate::parse("https://tile.openstreetmap.org/{z}/{x}/{y}.png")?;
/// let url = template.url_for(&TileId::new(3, 5, 2).unwrap());
/// assert_eq!(url, "https://tile.openstreetmap.org/3/5/2.png");
/// # Ok::<(), aerial::error::AerialError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    /// Parses the template, checking that all three placeholders are present.
    pub fn parse(template: &str) -> Result<Self, AerialError> {
        let template = template.trim();
        if template.is_empty() {
            return Err(AerialError::InvalidTemplate(
                "tile source url is not set".into(),
            ));
        }

        let mut has = [false; 3];
        for captures in PLACEHOLDER.captures_iter(template) {
            match captures[1].to_ascii_lowercase().as_str() {
                "z" => has[0] = true,
                "x" => has[1] = true,
                _ => has[2] = true,
            }
        }

        let missing: Vec<_> = ["{z}", "{x}", "{y}"]
            .iter()
            .zip(has)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AerialError::InvalidTemplate(format!(
                "'{template}' has no {} placeholder",
                missing.join(", ")
            )));
        }

        Ok(Self {
            template: template.to_string(),
        })
    }

    /// Url of the given tile.
    pub fn url_for(&self, id: &TileId) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |captures: &regex::Captures| {
                let value = match captures[1].to_ascii_lowercase().as_str() {
                    "z" => id.zoom(),
                    "x" => id.x(),
                    _ => id.y(),
                };
                value.to_string()
            })
            .into_owned()
    }

    /// The template string.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// File extension of the tiles, taken from the last path segment of the template.
    ///
    /// Returns `"tile"` if the template has no recognizable extension.
    pub fn extension(&self) -> String {
        let path = self
            .template
            .split(['?', '#'])
            .next()
            .unwrap_or(self.template.as_str());
        let last_segment = path.rsplit('/').next().unwrap_or(path);

        match last_segment.rsplit_once('.') {
            Some((_, ext))
                if !ext.is_empty()
                    && ext.len() <= 5
                    && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                ext.to_ascii_lowercase()
            }
            _ => DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl Display for UrlTemplate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.template)
    }
}

/// Identifies a tile source in the cache, so that tiles of different sources never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey {
    hash: String,
    extension: String,
}

impl SourceKey {
    /// Creates a key from the template: a stable hash of the template text plus tile file
    /// extension.
    pub fn for_template(template: &UrlTemplate) -> Self {
        let hash = blake3::hash(template.as_str().as_bytes()).to_hex();
        Self {
            hash: hash.as_str()[..SOURCE_HASH_LEN].to_string(),
            extension: template.extension(),
        }
    }

    /// Hex encoded hash of the source template.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// File extension of the tiles.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Tile source: url template plus its cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileSource {
    template: UrlTemplate,
    key: SourceKey,
}

impl TileSource {
    /// Creates a new source from the template string.
    pub fn new(template: &str) -> Result<Self, AerialError> {
        Ok(Self::from_template(UrlTemplate::parse(template)?))
    }

    /// Creates a new source from a parsed template.
    pub fn from_template(template: UrlTemplate) -> Self {
        let key = SourceKey::for_template(&template);
        Self { template, key }
    }

    /// Url template of the source.
    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }

    /// Cache key of the source.
    pub fn key(&self) -> &SourceKey {
        &self.key
    }

    /// Url of the given tile.
    pub fn url_for(&self, id: &TileId) -> String {
        self.template.url_for(id)
    }
}
