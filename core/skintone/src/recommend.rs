//! Styling recommendations keyed by skin tone and presentation.
//!
//! The [`Recommender`] trait is the seam for text-generation backends. The
//! deterministic [`TemplateRecommender`] is always available and is what
//! [`recommend_or_template`] falls back to when a backend fails.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SkinToneError;
use crate::tone::SkinTone;

/// Clothing presentation the recommendations are written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Presentation {
    /// Menswear.
    Male,
    /// Womenswear.
    #[default]
    Female,
}

impl Presentation {
    /// Parse a form value, treating anything unrecognized as the default.
    pub fn from_form_value(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Presentation::Male => "Male",
            Presentation::Female => "Female",
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Presentation {
    type Err = SkinToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Presentation::Male),
            "female" => Ok(Presentation::Female),
            _ => Err(SkinToneError::UnknownPresentation(s.to_string())),
        }
    }
}

/// One outfit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outfit {
    /// Shirt, blouse or tee.
    pub tops: String,
    /// Trousers, skirt or jeans.
    pub bottoms: String,
    /// Footwear.
    pub shoes: String,
}

/// Outfits by occasion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DressCodes {
    /// Formal events.
    pub formal: Outfit,
    /// Office wear.
    pub business: Outfit,
    /// Everyday wear.
    pub casual: Outfit,
    /// Evenings out.
    pub party: Outfit,
}

/// Hairstyle suggestion and upkeep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hairstyle {
    /// Suggested style.
    pub suggestion: String,
    /// Upkeep advice.
    pub maintenance_tips: String,
}

/// Jewellery and watches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessories {
    /// Earrings.
    pub earrings: String,
    /// Necklaces.
    pub necklaces: String,
    /// Bracelets or cuffs.
    pub bracelets: String,
    /// Watch.
    pub watches: String,
}

/// Base, balancing and accent colors that suit a tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    /// Base colors.
    pub primary: String,
    /// Balancing colors.
    pub secondary: String,
    /// Pops of color.
    pub accent: String,
}

/// Structured styling document returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Outfits by occasion.
    pub dress_codes: DressCodes,
    /// Hair advice.
    pub hairstyle: Hairstyle,
    /// Accessory advice.
    pub accessories: Accessories,
    /// Colors that suit the tone.
    pub color_palette: ColorPalette,
    /// Free-text explanation.
    pub reasoning: String,
    /// Retailer name → search URL.
    pub shopping_links: BTreeMap<String, String>,
}

/// Source of styling recommendations.
pub trait Recommender: Send + Sync {
    /// Produce recommendations for a tone, presentation and measured color.
    fn recommend(
        &self,
        tone: SkinTone,
        presentation: Presentation,
        rgb: [u8; 3],
    ) -> Result<Recommendation, SkinToneError>;
}

/// Deterministic recommendations from built-in templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRecommender;

impl Recommender for TemplateRecommender {
    fn recommend(
        &self,
        tone: SkinTone,
        presentation: Presentation,
        _rgb: [u8; 3],
    ) -> Result<Recommendation, SkinToneError> {
        Ok(template_recommendation(tone, presentation))
    }
}

/// Ask `recommender`, falling back to the templates if it fails.
pub fn recommend_or_template(
    recommender: &dyn Recommender,
    tone: SkinTone,
    presentation: Presentation,
    rgb: [u8; 3],
) -> Recommendation {
    recommender
        .recommend(tone, presentation, rgb)
        .unwrap_or_else(|err| {
            warn!(error = %err, %tone, %presentation, "recommender failed, using templates");
            template_recommendation(tone, presentation)
        })
}

/// Color palette for a tone.
pub fn palette_for(tone: SkinTone) -> ColorPalette {
    let (primary, secondary, accent) = match tone {
        SkinTone::Fair => ("Navy & White", "Soft Pink & Lavender", "Coral & Gold"),
        SkinTone::Medium => ("Burgundy & Olive", "Camel & Cream", "Teal & Copper"),
        SkinTone::Olive => (
            "Forest Green & Terracotta",
            "Warm Beige & Brown",
            "Amber & Rust",
        ),
        SkinTone::Deep => ("Royal Blue & Black", "Mustard & Bronze", "Electric Blue & Gold"),
    };
    ColorPalette {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        accent: accent.to_string(),
    }
}

fn outfit(tops: &str, bottoms: &str, shoes: &str) -> Outfit {
    Outfit {
        tops: tops.to_string(),
        bottoms: bottoms.to_string(),
        shoes: shoes.to_string(),
    }
}

fn dress_codes(presentation: Presentation) -> DressCodes {
    match presentation {
        Presentation::Female => DressCodes {
            formal: outfit(
                "Cream blouse with subtle sheen",
                "High-waist pencil skirt in charcoal",
                "Closed-toe pumps in nude",
            ),
            business: outfit(
                "Soft pink silk blouse",
                "Tailored wide-leg trousers",
                "Block heels in tan",
            ),
            casual: outfit(
                "Mustard yellow relaxed tee",
                "High-waist mom jeans",
                "Minimalist white sneakers",
            ),
            party: outfit(
                "Emerald green wrap top",
                "Black high-waist palazzo",
                "Strappy heels in gold",
            ),
        },
        Presentation::Male => DressCodes {
            formal: outfit(
                "White tailored shirt",
                "Navy tailored trousers",
                "Oxford shoes in black",
            ),
            business: outfit(
                "Light blue dress shirt",
                "Charcoal grey chinos",
                "Brown leather loafers",
            ),
            casual: outfit("Earth-tone henley", "Dark wash jeans", "White sneakers"),
            party: outfit(
                "Black fitted shirt",
                "Slim black trousers",
                "Leather ankle boots",
            ),
        },
    }
}

fn shopping_links(presentation: Presentation) -> BTreeMap<String, String> {
    let query = match presentation {
        Presentation::Female => "formal wear",
        Presentation::Male => "formal shirts",
    };
    BTreeMap::from([
        (
            "Amazon.in".to_string(),
            format!("https://www.amazon.in/s?k={}", query.replace(' ', "+")),
        ),
        (
            "Myntra".to_string(),
            format!("https://www.myntra.com/{}", query.replace(' ', "-")),
        ),
        ("Zara".to_string(), "https://www.zara.com/in/".to_string()),
    ])
}

/// Build the templated recommendation for a tone and presentation.
pub fn template_recommendation(tone: SkinTone, presentation: Presentation) -> Recommendation {
    let female = presentation == Presentation::Female;
    let pick = |f: &str, m: &str| (if female { f } else { m }).to_string();
    let palette = palette_for(tone);

    let reasoning = format!(
        "Recommendations are tailored for {tone} skin tone and {presentation} presentation. \
         Colors chosen complement {tone} undertones: {} as base, {} for balance, and {} for pops. \
         Outfit combinations suit Indian climate and occasions from office to parties.",
        palette.primary, palette.secondary, palette.accent
    );

    Recommendation {
        dress_codes: dress_codes(presentation),
        hairstyle: Hairstyle {
            suggestion: pick(
                "Sleek low bun with soft face-framing layers",
                "Clean side part with trimmed sides",
            ),
            maintenance_tips:
                "Use heat protectant; trim every 6–8 weeks; hydrate with light serum.".to_string(),
        },
        accessories: Accessories {
            earrings: pick("Small gold hoops or studs", "Minimal studs (if preferred)"),
            necklaces: pick("Delicate chain with pendant", "Subtle chain or none"),
            bracelets: pick("Thin leather or metal cuff", "Classic watch only"),
            watches: "Minimal leather-strap watch in silver or gold".to_string(),
        },
        color_palette: palette,
        reasoning,
        shopping_links: shopping_links(presentation),
    }
}
