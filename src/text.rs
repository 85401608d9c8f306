use core::cmp::Ordering;
use core::fmt::{Debug, Display, Formatter};
use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

type TextIndex = u32;

/// Interned name. Equal contents share one index, so equality and hashing
/// work on the index while ordering compares the contents.
#[derive(Hash, Eq, PartialEq, Clone, Copy)]
pub struct Text(TextIndex);

#[derive(Default)]
struct TextMap {
    val_to_idx: HashMap<String, TextIndex>,
    idx_to_val: Vec<String>,
}

impl TextMap {
    fn insert_str(&mut self, val: &str) -> TextIndex {
        if let Some(&idx) = self.val_to_idx.get(val) {
            idx
        } else {
            let idx = self.idx_to_val.len() as TextIndex;
            self.val_to_idx.insert(val.to_string(), idx);
            self.idx_to_val.push(val.to_string());
            idx
        }
    }
    fn get_str(&self, idx: TextIndex) -> &str {
        &self.idx_to_val[idx as usize]
    }
}

static TEXT_MAP: OnceLock<RwLock<TextMap>> = OnceLock::new();

fn text_map() -> &'static RwLock<TextMap> {
    TEXT_MAP.get_or_init(Default::default)
}

impl Text {
    pub fn new(s: &str) -> Self {
        let map: &mut TextMap = &mut text_map().write().expect("poisoned");
        Self(map.insert_str(s))
    }
    pub fn with_str<R>(self, func: impl FnOnce(&str) -> R) -> R {
        let map: &TextMap = &text_map().read().expect("poisoned");
        func(map.get_str(self.0))
    }
    pub fn is_empty(self) -> bool {
        self.with_str(str::is_empty)
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Ord for Text {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        let map: &TextMap = &text_map().read().expect("poisoned");
        map.get_str(self.0).cmp(map.get_str(other.0))
    }
}
impl PartialOrd for Text {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Text {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}
impl Debug for Text {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.with_str(|s| write!(f, "{s:?}"))
    }
}
