use crate::error::TableError;
use crate::lesson::DATA_DIR;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

const QUOTES_FILE: &str = "quotes.json";

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub texts: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct QuoteTable {
    categories: Vec<Category>,
}

impl QuoteTable {
    pub fn embedded() -> Result<Self, TableError> {
        let file = DATA_DIR
            .get_file(QUOTES_FILE)
            .ok_or(TableError::Missing(QUOTES_FILE))?;
        Ok(serde_json::from_str(file.contents_utf8().unwrap_or_default())?)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Up to `count` distinct texts of the category in random order
    pub fn random_texts<R: Rng + ?Sized>(
        &self,
        id: &str,
        count: usize,
        rng: &mut R,
    ) -> Option<Vec<&str>> {
        let category = self.get(id)?;
        Some(
            category
                .texts
                .choose_multiple(rng, count)
                .map(String::as_str)
                .collect(),
        )
    }

    /// Typing-test text: random texts joined by a single space
    pub fn build_text<R: Rng + ?Sized>(&self, id: &str, count: usize, rng: &mut R) -> Option<String> {
        self.random_texts(id, count, rng).map(|texts| texts.join(" "))
    }
}
