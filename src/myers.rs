//! Shared Myers shortest-edit-script engine, generic over the compared item
//! type. `line_diff` (C1) feeds it whitespace-normalized line keys;
//! `intraline` (C2) feeds it individual `char`s. Keeping one implementation
//! means both components get the same grouping behavior and the same
//! opcode-coverage invariant (spec §8) for free.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// `(tag, i1, i2, j1, j2)` — `[i1,i2)` indexes `a`, `[j1,j2)` indexes `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: Tag,
    pub i1: usize,
    pub i2: usize,
    pub j1: usize,
    pub j2: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditTag {
    Equal,
    Delete,
    Insert,
}

fn shortest_edit_trace<T: PartialEq>(a: &[T], b: &[T]) -> Vec<HashMap<i64, i64>> {
    let n = a.len() as i64;
    let m = b.len() as i64;
    let max = n + m;

    let mut v: HashMap<i64, i64> = HashMap::new();
    v.insert(1, 0);
    let mut trace = Vec::new();

    for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && *v.get(&(k - 1)).unwrap_or(&0) < *v.get(&(k + 1)).unwrap_or(&0))
            {
                *v.get(&(k + 1)).unwrap_or(&0)
            } else {
                *v.get(&(k - 1)).unwrap_or(&0) + 1
            };
            let mut y = x - k;

            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }

            v.insert(k, x);

            if x >= n && y >= m {
                return trace;
            }
            k += 2;
        }
    }
    trace
}

fn backtrack<T: PartialEq>(a: &[T], b: &[T], trace: &[HashMap<i64, i64>]) -> Vec<EditTag> {
    let mut x = a.len() as i64;
    let mut y = b.len() as i64;
    let mut tags = Vec::new();

    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as i64;
        let k = x - y;
        let prev_k = if k == -d || (k != d && *v.get(&(k - 1)).unwrap_or(&0) < *v.get(&(k + 1)).unwrap_or(&0)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = *v.get(&prev_k).unwrap_or(&0);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            tags.push(EditTag::Equal);
            x -= 1;
            y -= 1;
        }

        if d > 0 {
            if x == prev_x {
                tags.push(EditTag::Insert);
            } else {
                tags.push(EditTag::Delete);
            }
        }

        x = prev_x;
        y = prev_y;
    }

    tags.reverse();
    tags
}

fn group_opcodes(tags: &[EditTag]) -> Vec<Opcode> {
    let mut opcodes = Vec::new();
    let mut ai = 0usize;
    let mut bi = 0usize;
    let mut idx = 0;

    while idx < tags.len() {
        let i1 = ai;
        let j1 = bi;

        if tags[idx] == EditTag::Equal {
            while idx < tags.len() && tags[idx] == EditTag::Equal {
                ai += 1;
                bi += 1;
                idx += 1;
            }
            opcodes.push(Opcode { tag: Tag::Equal, i1, i2: ai, j1, j2: bi });
        } else {
            let mut has_delete = false;
            let mut has_insert = false;
            while idx < tags.len() && tags[idx] != EditTag::Equal {
                match tags[idx] {
                    EditTag::Delete => {
                        has_delete = true;
                        ai += 1;
                    }
                    EditTag::Insert => {
                        has_insert = true;
                        bi += 1;
                    }
                    EditTag::Equal => unreachable!(),
                }
                idx += 1;
            }
            let tag = match (has_delete, has_insert) {
                (true, true) => Tag::Replace,
                (true, false) => Tag::Delete,
                (false, true) => Tag::Insert,
                (false, false) => unreachable!("non-equal run with no delete or insert"),
            };
            opcodes.push(Opcode { tag, i1, i2: ai, j1, j2: bi });
        }
    }

    opcodes
}

/// Runs the Myers shortest-edit-script search and groups the result into
/// opcodes covering `[0,|a|) x [0,|b|)` without gap or overlap.
pub fn diff<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Opcode> {
    let trace = shortest_edit_trace(a, b);
    let tags = backtrack(a, b, &trace);
    group_opcodes(&tags)
}

/// `2*matches / total`, the same ratio `difflib.SequenceMatcher.ratio()`
/// computes from `get_matching_blocks()` — used by C2's 0.6 similarity gate.
pub fn ratio(a_len: usize, b_len: usize, opcodes: &[Opcode]) -> f64 {
    let total = a_len + b_len;
    if total == 0 {
        return 1.0;
    }
    let matches: usize = opcodes
        .iter()
        .filter(|op| op.tag == Tag::Equal)
        .map(|op| op.i2 - op.i1)
        .sum();
    2.0 * matches as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_input_without_gaps_or_overlap() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        let ops = diff(&a, &b);

        let mut last_i = 0;
        let mut last_j = 0;
        for op in &ops {
            assert_eq!(op.i1, last_i);
            assert_eq!(op.j1, last_j);
            last_i = op.i2;
            last_j = op.j2;
        }
        assert_eq!(last_i, a.len());
        assert_eq!(last_j, b.len());
    }

    #[test]
    fn identical_sequences_are_one_equal_opcode() {
        let a: Vec<char> = "same".chars().collect();
        let b: Vec<char> = "same".chars().collect();
        let ops = diff(&a, &b);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].tag, Tag::Equal);
        assert_eq!(ratio(a.len(), b.len(), &ops), 1.0);
    }

    #[test]
    fn completely_different_sequences_have_low_ratio() {
        let a: Vec<char> = "abc".chars().collect();
        let b: Vec<char> = "xyz".chars().collect();
        let ops = diff(&a, &b);
        assert_eq!(ratio(a.len(), b.len(), &ops), 0.0);
    }
}
