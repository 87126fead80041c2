use crate::annotations::coco::Category;
use crate::error::{DatasetError, DatasetResult};
use itertools::Itertools;
use std::collections::HashMap;

/// Maps COCO's sparse category ids (1..=90 with gaps) onto a dense label space `0..K`.
///
/// Dense labels are assigned in ascending order of sparse id, so building the index twice from
/// the same ids gives the same mapping regardless of the order the ids were listed in. The index
/// is immutable once built and can be shared freely between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryIndex {
    /// dense label -> sparse id
    sparse_ids: Vec<u64>,
    /// dense label -> name
    names: Vec<String>,
    /// sparse id -> dense label
    dense_by_sparse: HashMap<u64, usize>,
}

impl CategoryIndex {
    pub fn build(sparse_ids: &[u64], names: &HashMap<u64, String>) -> DatasetResult<Self> {
        if let Some(duplicate) = sparse_ids.iter().duplicates().next() {
            return Err(DatasetError::InvalidCategoryData {
                reason: format!("category id {} appears more than once", duplicate),
            });
        }
        let sparse_ids: Vec<u64> = sparse_ids.iter().copied().sorted_unstable().collect();
        let names = sparse_ids
            .iter()
            .map(|id| {
                names
                    .get(id)
                    .cloned()
                    .ok_or_else(|| DatasetError::InvalidCategoryData {
                        reason: format!("category id {} has no name", id),
                    })
            })
            .collect::<DatasetResult<Vec<String>>>()?;
        let dense_by_sparse = sparse_ids
            .iter()
            .enumerate()
            .map(|(dense, &sparse)| (sparse, dense))
            .collect();
        Ok(CategoryIndex {
            sparse_ids,
            names,
            dense_by_sparse,
        })
    }

    /// Builds the index from category records as they come out of an annotation store.
    pub fn from_categories(categories: &[&Category]) -> DatasetResult<Self> {
        let ids: Vec<u64> = categories.iter().map(|cat| cat.id).collect();
        let names: HashMap<u64, String> = categories
            .iter()
            .map(|cat| (cat.id, cat.name.clone()))
            .collect();
        CategoryIndex::build(&ids, &names)
    }

    pub fn to_dense(&self, sparse_id: u64) -> DatasetResult<usize> {
        self.dense_by_sparse
            .get(&sparse_id)
            .copied()
            .ok_or(DatasetError::UnknownCategory { sparse_id })
    }

    pub fn name_of(&self, sparse_id: u64) -> DatasetResult<&str> {
        let dense = self.to_dense(sparse_id)?;
        Ok(&self.names[dense])
    }

    pub fn to_sparse(&self, dense: usize) -> Option<u64> {
        self.sparse_ids.get(dense).copied()
    }

    pub fn dense_name(&self, dense: usize) -> Option<&str> {
        self.names.get(dense).map(String::as_str)
    }

    /// Sparse ids in dense order.
    pub fn sparse_ids(&self) -> &[u64] {
        &self.sparse_ids
    }

    pub fn len(&self) -> usize {
        self.sparse_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sparse_ids.is_empty()
    }
}
