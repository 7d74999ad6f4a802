//! Reference glyph images keyed by piece label.

use crate::board::{ParseLabelError, PieceColor, PieceLabel};
use image::imageops::{self, FilterType};
use image::GrayImage;
use log::warn;
use std::collections::BTreeMap;

/// Side length the templates are usually normalised to before matching.
pub const CANONICAL_TEMPLATE_SIZE: u32 = 60;

/// Read-only set of grayscale templates, iterated in label order
/// (red before black, then by kind).
#[derive(Clone, Debug, Default)]
pub struct TemplateLibrary {
    templates: BTreeMap<PieceLabel, GrayImage>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, image)` pairs where names look like `red_king`.
    pub fn from_named<I, S>(entries: I) -> Result<Self, ParseLabelError>
    where
        I: IntoIterator<Item = (S, GrayImage)>,
        S: AsRef<str>,
    {
        let mut lib = Self::new();
        for (name, image) in entries {
            lib.insert(name.as_ref().parse()?, image);
        }
        Ok(lib)
    }

    /// Add or replace a template, returning the previous one.
    pub fn insert(&mut self, label: PieceLabel, image: GrayImage) -> Option<GrayImage> {
        self.templates.insert(label, image)
    }

    pub fn with_template(mut self, label: PieceLabel, image: GrayImage) -> Self {
        self.insert(label, image);
        self
    }

    /// Resize every template to `width × height` once up front.
    ///
    /// A zero dimension leaves the library unchanged.
    pub fn with_canonical_size(mut self, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            warn!("templates: ignoring canonical size {width}x{height}");
            return self;
        }
        for image in self.templates.values_mut() {
            if image.dimensions() != (width, height) {
                *image = imageops::resize(image, width, height, FilterType::Triangle);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, label: &PieceLabel) -> Option<&GrayImage> {
        self.templates.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PieceLabel, &GrayImage)> {
        self.templates.iter().map(|(l, img)| (*l, img))
    }

    /// Templates of the given colour; all of them when it is unresolved.
    pub fn candidates(&self, color: PieceColor) -> impl Iterator<Item = (PieceLabel, &GrayImage)> {
        let side = color.side();
        self.iter()
            .filter(move |(label, _)| side.is_none_or(|s| label.side == s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PieceKind, Side};
    use image::Luma;

    fn blank(size: u32) -> GrayImage {
        GrayImage::from_pixel(size, size, Luma([128]))
    }

    #[test]
    fn candidates_follow_colour_and_label_order() {
        let lib = TemplateLibrary::from_named([
            ("black_rook", blank(8)),
            ("red_pawn", blank(8)),
            ("red_king", blank(8)),
        ])
        .unwrap();

        let red: Vec<_> = lib.candidates(PieceColor::Red).map(|(l, _)| l).collect();
        assert_eq!(
            red,
            vec![
                PieceLabel::new(Side::Red, PieceKind::King),
                PieceLabel::new(Side::Red, PieceKind::Pawn)
            ]
        );
        assert_eq!(lib.candidates(PieceColor::Black).count(), 1);
        assert_eq!(lib.candidates(PieceColor::Unresolved).count(), 3);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(TemplateLibrary::from_named([("red_queen", blank(4))]).is_err());
    }

    #[test]
    fn canonical_size_resizes_all_templates() {
        let lib = TemplateLibrary::new()
            .with_template(PieceLabel::new(Side::Red, PieceKind::Cannon), blank(90))
            .with_template(PieceLabel::new(Side::Black, PieceKind::Cannon), blank(32))
            .with_canonical_size(CANONICAL_TEMPLATE_SIZE, CANONICAL_TEMPLATE_SIZE);
        assert!(lib.iter().all(|(_, img)| img.dimensions() == (60, 60)));
    }
}
