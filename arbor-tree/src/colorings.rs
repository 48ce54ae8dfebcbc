use crate::{Coloring, TreeDocument};
use serde_json::Map;

// ----------------------------------------------------------------------------
// Color Scale

/// The `meta.colorings` key for the country coloring.
pub const COUNTRY_COLORING_KEY: &str = "country";

/// Fixed 16-color palette for country scales, in assignment order.
pub const COUNTRY_COLOR_SCALE: [&str; 16] = [
    "#277F8E",
    "#084A9F",
    "#4187E0",
    "#B2D3FD",
    "#DFC6FF",
    "#9069C2",
    "#440278",
    "#BD3232",
    "#ED5151",
    "#FF9999",
    "#FF8A24",
    "#FFDABA",
    "#A76738",
    "#FDE725",
    "#A0DA39",
    "#4AB569",
];

/// Writes a categorical country color scale into the document's
/// `meta.colorings`.
///
/// Countries are paired positionally with [`COUNTRY_COLOR_SCALE`]; the
/// palette bounds the scale, so countries beyond the sixteenth are dropped
/// and unused palette colors stay unused. If a `country` coloring already
/// exists its `scale` is replaced, otherwise a new entry is appended.
///
/// ## Examples
///
/// ```rust
/// use arbor_tree::{apply_country_scale, TreeDocument};
///
/// let mut doc = TreeDocument::from_slice(br#"{"meta": {}, "tree": {"name": "root"}}"#)?;
/// apply_country_scale(&mut doc, &["USA".to_string(), "France".to_string()]);
///
/// let scale = doc.meta.colorings[0].scale.as_ref().unwrap();
/// assert_eq!(scale[0], ("USA".to_string(), "#277F8E".to_string()));
/// assert_eq!(scale[1], ("France".to_string(), "#084A9F".to_string()));
/// # Ok::<(), serde_json::Error>(())
/// ```
pub fn apply_country_scale(doc: &mut TreeDocument, countries: &[String]) {
    let scale: Vec<(String, String)> = countries
        .iter()
        .zip(COUNTRY_COLOR_SCALE)
        .map(|(country, color)| (country.clone(), color.to_string()))
        .collect();

    let existing =
        doc.meta.colorings.iter_mut().find(|coloring| coloring.key == COUNTRY_COLORING_KEY);
    match existing {
        Some(coloring) => coloring.scale = Some(scale),
        None => doc.meta.colorings.push(Coloring {
            key: COUNTRY_COLORING_KEY.to_string(),
            title: Some("Country".to_string()),
            scale_type: Some("categorical".to_string()),
            scale: Some(scale),
            other: Map::new(),
        }),
    }
}

// ----------------------------------------------------------------------------
// Tests
