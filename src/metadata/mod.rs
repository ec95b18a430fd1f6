mod fields;

pub use fields::{AudiobookMetadata, PublishedYear, ScrapedFields};
