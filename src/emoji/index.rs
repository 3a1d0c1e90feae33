//! Corpus Index
//!
//! Maps each surface word (emoji id or keyword) present in the vocabulary to
//! the emoji it denotes.

use hashbrown::HashMap;
use tracing::info;

use super::dataset::EmojiDataset;
use crate::vector::VectorStore;

/// Emoji ids denoted by one word, in first-insertion order, without repeats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    ids: Vec<String>,
}

impl Category {
    fn single(id: &str) -> Self {
        Self {
            ids: vec![id.to_string()],
        }
    }

    fn add(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Number of distinct emoji
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false; kept for API symmetry
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

/// Word -> category map in first-seen word order
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    words: Vec<String>,
    categories: Vec<Category>,
    positions: HashMap<String, usize>,
}

impl CorpusIndex {
    fn insert(&mut self, word: &str, id: &str) {
        match self.positions.get(word) {
            Some(&pos) => self.categories[pos].add(id),
            None => {
                self.positions.insert(word.to_string(), self.words.len());
                self.words.push(word.to_string());
                self.categories.push(Category::single(id));
            }
        }
    }

    /// Representative words in first-seen order
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn category(&self, word: &str) -> Option<&Category> {
        self.positions.get(word).map(|&p| &self.categories[p])
    }

    /// Category of the representative at `position`
    ///
    /// # Panics
    /// Panics if `position >= len()`.
    pub fn category_at(&self, position: usize) -> &Category {
        &self.categories[position]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.words
            .iter()
            .map(String::as_str)
            .zip(self.categories.iter())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Builds a [`CorpusIndex`] from an emoji dataset and a vocabulary
pub struct CorpusIndexer;

impl CorpusIndexer {
    /// Index against the words of a vector store
    pub fn build(dataset: &EmojiDataset, store: &VectorStore) -> CorpusIndex {
        let index = Self::build_with(dataset, |word| store.contains(word));
        info!(
            "Indexed {} words over {} emoji ({} vocabulary entries)",
            index.len(),
            dataset.len(),
            store.len()
        );
        index
    }

    /// Index against any vocabulary membership test
    pub fn build_with<F>(dataset: &EmojiDataset, in_vocabulary: F) -> CorpusIndex
    where
        F: Fn(&str) -> bool,
    {
        let mut index = CorpusIndex::default();
        for record in dataset.iter() {
            if in_vocabulary(&record.id) {
                index.insert(&record.id, &record.id);
            }
            for keyword in &record.keywords {
                if in_vocabulary(keyword) {
                    index.insert(keyword, &record.id);
                }
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emoji::EmojiRecord;
    use hashbrown::HashSet;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    fn dataset() -> EmojiDataset {
        EmojiDataset::from_records(vec![
            EmojiRecord::new("grinning", "😀", kw(&["face", "smile", "happy"])),
            EmojiRecord::new("smile", "😄", kw(&["face", "happy", "smile"])),
            EmojiRecord::new("cat", "🐱", kw(&["animal", "pet"])),
            EmojiRecord::new("dog", "🐶", kw(&["animal", "pet", "nonword"])),
        ])
    }

    #[test]
    fn test_categories() {
        let vocab: HashSet<&str> = ["face", "smile", "happy", "cat", "animal", "pet", "dog"]
            .into_iter()
            .collect();
        let index = CorpusIndexer::build_with(&dataset(), |w| vocab.contains(w));

        assert_eq!(
            index.words(),
            &kw(&["face", "smile", "happy", "cat", "animal", "pet", "dog"])[..]
        );
        assert_eq!(index.category("face").unwrap().ids(), &kw(&["grinning", "smile"])[..]);
        // "smile" is both an id and its own keyword; counted once
        assert_eq!(index.category("smile").unwrap().ids(), &kw(&["grinning", "smile"])[..]);
        assert_eq!(index.category("cat").unwrap().ids(), &kw(&["cat"])[..]);
        assert_eq!(index.category("pet").unwrap().len(), 2);
        assert!(index.category("grinning").is_none());
        assert!(index.category("nonword").is_none());
        assert!(index.iter().all(|(_, c)| !c.is_empty()));
    }

    #[test]
    fn test_build_from_store() {
        let mut store = VectorStore::new(2);
        store.push("animal", &[1.0, 0.0]).unwrap();
        store.push("dog", &[0.0, 1.0]).unwrap();

        let index = CorpusIndexer::build(&dataset(), &store);
        assert_eq!(index.words(), &kw(&["animal", "dog"])[..]);
        assert_eq!(index.category("animal").unwrap().ids(), &kw(&["cat", "dog"])[..]);
    }
}
