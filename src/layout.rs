//! Newspaper Grid Layout
//!
//! Assigns each card its placement attributes from its position in the list.
//! Viewport breakpoints are handled in CSS; this only knows logical slots.

/// Logical slots per row
pub const ROW_SLOTS: usize = 2;

/// Grid columns a card occupies
pub const COLUMN_SPAN: u8 = 1;

/// Card treatment, alternating by index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardVariant {
    Primary,
    Secondary,
}

impl CardVariant {
    pub fn class_name(&self) -> &'static str {
        match self {
            CardVariant::Primary => "card-primary",
            CardVariant::Secondary => "card-secondary",
        }
    }
}

/// Placement attributes for one card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub variant: CardVariant,
    pub column_span: u8,
    pub is_last_in_row: bool,
    pub is_last_row: bool,
}

impl GridPosition {
    /// CSS classes for the card wrapper
    pub fn class_name(&self) -> String {
        let mut c = String::from("grid-card ");
        c.push_str(self.variant.class_name());
        if self.column_span > 1 {
            c.push_str(&format!(" span-{}", self.column_span));
        }
        if self.is_last_in_row { c.push_str(" last-in-row"); }
        if self.is_last_row { c.push_str(" last-row"); }
        c
    }
}

/// Placement for the card at `index` in a list of `total` cards.
///
/// Expects `index < total`.
pub fn compute_position(index: usize, total: usize) -> GridPosition {
    debug_assert!(index < total, "index {} out of range for {} cards", index, total);

    let variant = if index % 2 == 0 {
        CardVariant::Primary
    } else {
        CardVariant::Secondary
    };

    // Start of the final row; a lone trailing card starts its own row
    let last_row_start = (total.saturating_sub(1) / ROW_SLOTS) * ROW_SLOTS;

    GridPosition {
        variant,
        column_span: COLUMN_SPAN,
        is_last_in_row: index % ROW_SLOTS == ROW_SLOTS - 1,
        is_last_row: index >= last_row_start,
    }
}

/// Placements for a whole list, in order
pub fn layout(total: usize) -> impl Iterator<Item = GridPosition> {
    (0..total).map(move |index| compute_position(index, total))
}
