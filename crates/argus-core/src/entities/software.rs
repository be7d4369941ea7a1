//! Software detection from text mentions and color signatures.

use tracing::debug;

use super::{DetectionMethod, SoftwareEntity};
use crate::catalog::Catalog;
use crate::features::color::count_in_band;
use crate::raster::RasterImage;
use crate::round3;

const OCCURRENCE_WEIGHT: f32 = 0.3;
const CONTEXT_WEIGHT: f32 = 0.1;

/// Confidence of a text mention: 0.3 per occurrence plus 0.1 per context
/// word present, clamped to 1.0.
pub fn text_confidence(occurrences: usize, context_words: usize) -> f32 {
    (occurrences as f32 * OCCURRENCE_WEIGHT + context_words as f32 * CONTEXT_WEIGHT).min(1.0)
}

/// Upper-cases the first letter of every alphabetic run.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Text mentions above `threshold`, followed by visual signature hits.
/// A product found both ways is reported twice.
pub fn detect_software(
    text: &str,
    image: &RasterImage,
    catalog: &Catalog,
    threshold: f32,
) -> Vec<SoftwareEntity> {
    let lower = text.to_lowercase();
    let context = catalog
        .context_words
        .iter()
        .filter(|w| lower.contains(w.as_str()))
        .count();

    let mut found = Vec::new();
    for group in &catalog.software {
        for name in &group.names {
            let occurrences = lower.matches(name.as_str()).count();
            if occurrences == 0 {
                continue;
            }
            let confidence = text_confidence(occurrences, context);
            if confidence > threshold {
                found.push(SoftwareEntity {
                    name: title_case(name),
                    category: group.category,
                    confidence: round3(confidence),
                    detection_method: DetectionMethod::Text,
                });
            }
        }
    }

    found.extend(detect_visual(image, catalog));
    found
}

/// Products whose color signature covers more than its pixel minimum.
pub fn detect_visual(image: &RasterImage, catalog: &Catalog) -> Vec<SoftwareEntity> {
    catalog
        .visual_signatures
        .iter()
        .filter_map(|signature| {
            let pixels = count_in_band(image.rgb(), &signature.band);
            debug!(product = %signature.name, pixels, "visual signature probe");
            (pixels > signature.min_pixels).then(|| SoftwareEntity {
                name: signature.name.clone(),
                category: signature.category,
                confidence: signature.confidence,
                detection_method: DetectionMethod::Visual,
            })
        })
        .collect()
}
