//! Column name normalization for header records

use std::collections::HashMap;

/// Name blank columns and make duplicate names unique.
///
/// A blank name becomes `Unnamed: {index}`. The second occurrence of `x`
/// becomes `x.1`, the third `x.2`, skipping any suffixed name that is
/// already taken.
pub fn normalize_header(fields: Vec<String>) -> Vec<String> {
    // Name -> next suffix to try
    let mut counts: HashMap<String, usize> = HashMap::with_capacity(fields.len());
    let mut names = Vec::with_capacity(fields.len());

    for (idx, field) in fields.into_iter().enumerate() {
        let mut name = if field.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            field
        };

        if let Some(&next) = counts.get(&name) {
            let mut suffix = next;
            let mut candidate = format!("{}.{}", name, suffix);
            while counts.contains_key(&candidate) {
                suffix += 1;
                candidate = format!("{}.{}", name, suffix);
            }
            counts.insert(name, suffix + 1);
            name = candidate;
        }

        counts.insert(name.clone(), 1);
        names.push(name);
    }

    names
}
