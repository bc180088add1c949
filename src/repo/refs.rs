//! Branch enumeration for cleanup and cascade decisions.
//!
//! Two query modes against the same mechanism: branches that point exactly at
//! a commit (cleanup candidates) and branches whose history contains it
//! (cascade candidates). Points-at results are always a subset of contains
//! results for the same commit.

use anyhow::Result;
use std::cmp::Ordering;

use super::Repository;
use crate::error::LandError;

const BRANCH_NAMESPACE: &str = "refs/heads/";

/// How to match branches against a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefQuery {
    /// Branches pointing exactly at the commit
    PointsAt,
    /// Branches whose history contains the commit
    Contains,
}

impl Repository {
    /// Find local branches matching `query` against `commit`, as
    /// `(branch name, branch head hash)` pairs sorted in case-insensitive
    /// natural order.
    pub fn branches_for_commit(
        &self,
        commit: &str,
        query: RefQuery,
    ) -> Result<Vec<(String, String)>> {
        let filter = match query {
            RefQuery::PointsAt => "--points-at",
            RefQuery::Contains => "--contains",
        };
        let lines = self.runner().run_checked(&[
            "for-each-ref",
            filter,
            commit,
            "--format=%(refname) %(objectname)",
            "--",
        ])?;

        let mut branches = Vec::new();
        for line in lines.lines() {
            if line.is_empty() {
                continue;
            }

            let mut parts = line.splitn(2, ' ');
            let (ref_name, ref_hash) = match (parts.next(), parts.next()) {
                (Some(name), Some(hash)) if !hash.is_empty() => (name, hash),
                _ => {
                    return Err(LandError::internal(format!(
                        "unparsable for-each-ref line: \"{}\"",
                        line
                    )))
                }
            };

            // Only local branches participate in cleanup and cascade.
            if let Some(branch) = ref_name.strip_prefix(BRANCH_NAMESPACE) {
                branches.push((branch.to_string(), ref_hash.to_string()));
            }
        }

        branches.sort_by(|a, b| natural_cmp_ignore_case(&a.0, &b.0));
        Ok(branches)
    }
}

/// Case-insensitive natural ordering: digit runs compare numerically, so
/// "branch-2" sorts before "branch-10".
pub fn natural_cmp_ignore_case(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().flat_map(|c| c.to_lowercase()).collect();
    let b: Vec<char> = b.chars().flat_map(|c| c.to_lowercase()).collect();

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let ai = i;
            let bj = j;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let na: String = a[ai..i].iter().collect();
            let nb: String = b[bj..j].iter().collect();
            // Compare digit runs numerically: longer run of significant
            // digits wins, then lexicographic on equal length.
            let na = na.trim_start_matches('0');
            let nb = nb.trim_start_matches('0');
            let ord = na.len().cmp(&nb.len()).then_with(|| na.cmp(nb));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}
