//! Satellite embedding band contract.

/// Number of embedding dimensions per pixel
pub const EMBEDDING_DIMENSIONS: usize = 64;

/// Embedding band identifiers, in collection order
pub const EMBEDDING_BANDS: BandSet = BandSet([
    "A00", "A01", "A02", "A03", "A04", "A05", "A06", "A07",
    "A08", "A09", "A10", "A11", "A12", "A13", "A14", "A15",
    "A16", "A17", "A18", "A19", "A20", "A21", "A22", "A23",
    "A24", "A25", "A26", "A27", "A28", "A29", "A30", "A31",
    "A32", "A33", "A34", "A35", "A36", "A37", "A38", "A39",
    "A40", "A41", "A42", "A43", "A44", "A45", "A46", "A47",
    "A48", "A49", "A50", "A51", "A52", "A53", "A54", "A55",
    "A56", "A57", "A58", "A59", "A60", "A61", "A62", "A63",
]);

/// Fixed, ordered set of embedding band names.
///
/// Used both to select bands from an annual composite and as the feature
/// columns a land-cover training table must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSet([&'static str; EMBEDDING_DIMENSIONS]);

impl BandSet {
    pub fn names(&self) -> &[&'static str] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }
}
