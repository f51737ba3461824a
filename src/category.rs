//! This file defines the closed set of expense categories and how a category
//! stored alongside an expense maps onto that set.
//!
//! The store may hold category text that is not one of the known labels (for
//! example rows written by an older client). That text is kept as-is so it
//! survives a round trip, but for grouping, filtering and display it is
//! treated as [Category::Other].

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A category for expenses, e.g. 'Food & Dining', 'Transportation'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Groceries, restaurants and takeaways.
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    /// Fuel, fares and parking.
    Transportation,
    /// General retail purchases.
    Shopping,
    /// Movies, games and events.
    Entertainment,
    /// Rent, power, internet and other recurring bills.
    #[serde(rename = "Bills & Utilities")]
    BillsAndUtilities,
    /// Medical and pharmacy costs.
    Healthcare,
    /// Courses, books and tuition.
    Education,
    /// Flights, accommodation and holiday spending.
    Travel,
    /// Work related expenses.
    Business,
    /// Anything else, including unrecognised categories.
    Other,
}

impl Category {
    /// Every category, in the order they are offered to the user.
    pub const ALL: [Category; 10] = [
        Category::FoodAndDining,
        Category::Transportation,
        Category::Shopping,
        Category::Entertainment,
        Category::BillsAndUtilities,
        Category::Healthcare,
        Category::Education,
        Category::Travel,
        Category::Business,
        Category::Other,
    ];

    /// The label shown to the user and written to the store.
    pub fn label(self) -> &'static str {
        match self {
            Category::FoodAndDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::BillsAndUtilities => "Bills & Utilities",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Travel => "Travel",
            Category::Business => "Business",
            Category::Other => "Other",
        }
    }

    /// Find the category whose label is exactly `label`.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.label() == label)
    }

    /// The icon name used when rendering the category.
    pub fn icon(self) -> &'static str {
        match self {
            Category::FoodAndDining => "utensils",
            Category::Transportation => "car",
            Category::Shopping => "shopping-bag",
            Category::Entertainment => "film",
            Category::BillsAndUtilities => "receipt",
            Category::Healthcare => "heart-pulse",
            Category::Education => "graduation-cap",
            Category::Travel => "plane",
            Category::Business => "briefcase",
            Category::Other => "circle-ellipsis",
        }
    }

    /// The chart colour for the category as a CSS hex string.
    pub fn color(self) -> &'static str {
        match self {
            Category::FoodAndDining => "#f97316",
            Category::Transportation => "#3b82f6",
            Category::Shopping => "#ec4899",
            Category::Entertainment => "#8b5cf6",
            Category::BillsAndUtilities => "#eab308",
            Category::Healthcare => "#ef4444",
            Category::Education => "#14b8a6",
            Category::Travel => "#06b6d4",
            Category::Business => "#64748b",
            Category::Other => "#9ca3af",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The category text as it is held in the store.
///
/// Use [StoredCategory::bucket] whenever the category is grouped, filtered or
/// displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StoredCategory {
    /// One of the known category labels.
    Known(Category),
    /// Text that does not match any known label, possibly empty.
    Unrecognized(String),
}

impl StoredCategory {
    /// The category used for grouping and display.
    pub fn bucket(&self) -> Category {
        match self {
            StoredCategory::Known(category) => *category,
            StoredCategory::Unrecognized(_) => Category::Other,
        }
    }

    /// The text written back to the store.
    pub fn as_str(&self) -> &str {
        match self {
            StoredCategory::Known(category) => category.label(),
            StoredCategory::Unrecognized(text) => text,
        }
    }
}

impl From<Category> for StoredCategory {
    fn from(category: Category) -> Self {
        StoredCategory::Known(category)
    }
}

impl From<String> for StoredCategory {
    fn from(text: String) -> Self {
        match Category::from_label(&text) {
            Some(category) => StoredCategory::Known(category),
            None => StoredCategory::Unrecognized(text),
        }
    }
}

impl From<&str> for StoredCategory {
    fn from(text: &str) -> Self {
        StoredCategory::from(text.to_owned())
    }
}

impl From<StoredCategory> for String {
    fn from(category: StoredCategory) -> Self {
        match category {
            StoredCategory::Known(category) => category.label().to_owned(),
            StoredCategory::Unrecognized(text) => text,
        }
    }
}
