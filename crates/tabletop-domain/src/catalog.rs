//! Catalog rules for addon selection.

/// Number of items a customer may pick from one addon category on one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddonSelectionRule {
    pub min: u32,
    pub max: Option<u32>,
}

impl AddonSelectionRule {
    /// A required category demands at least one pick even when its own minimum is zero.
    pub fn new(min_selection: i32, max_selection: Option<i32>, is_required: bool) -> Self {
        let min = u32::try_from(min_selection).unwrap_or(0);
        let min = if is_required { min.max(1) } else { min };
        let max = max_selection.map(|m| u32::try_from(m).unwrap_or(0));
        Self { min, max }
    }

    pub fn allows(&self, count: u32) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

/// `min_selection <= max_selection` when a maximum is set, and neither is negative.
pub fn selection_bounds_are_valid(min_selection: i32, max_selection: Option<i32>) -> bool {
    min_selection >= 0
        && max_selection.is_none_or(|max| max >= 0 && max >= min_selection)
}
