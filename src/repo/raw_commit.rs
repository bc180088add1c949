//! Raw commit object surgery.
//!
//! Landing into the empty state merges on top of a synthetic empty commit,
//! then rewrites the result to drop the synthetic parent. That rewrite needs
//! explicit control of a commit's parent list, which porcelain commands do
//! not offer; we read and write raw commit objects instead.

use anyhow::Result;

use super::Repository;
use crate::error::LandError;

/// Identity used for the synthetic empty commit. It never survives into
/// published history: the commit exists only to give git a merge target, and
/// the result is rewritten to drop it.
const EMPTY_IDENT: &str = "runway <runway@localhost> 0 +0000";

/// A parsed commit object.
///
/// Only the headers the land engine needs are retained. Signature headers are
/// intentionally dropped: a parent rewrite invalidates any signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    pub tree: String,
    pub parents: Vec<String>,
    pub author: String,
    pub committer: String,
    pub message: String,
}

impl RawCommit {
    /// Parse the output of `git cat-file commit`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;

        let mut lines = raw.lines();
        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            // Continuation lines belong to multi-line headers (gpgsig); those
            // headers are dropped wholesale.
            if line.starts_with(' ') {
                continue;
            }
            let (key, value) = match line.split_once(' ') {
                Some(pair) => pair,
                None => {
                    return Err(LandError::internal(format!(
                        "unparsable commit header line: \"{}\"",
                        line
                    )))
                }
            };
            match key {
                "tree" => tree = Some(value.to_string()),
                "parent" => parents.push(value.to_string()),
                "author" => author = Some(value.to_string()),
                "committer" => committer = Some(value.to_string()),
                _ => {}
            }
        }

        let message: String = lines.collect::<Vec<_>>().join("\n");

        match (tree, author, committer) {
            (Some(tree), Some(author), Some(committer)) => Ok(Self {
                tree,
                parents,
                author,
                committer,
                message,
            }),
            _ => Err(LandError::internal(
                "commit object is missing a tree, author, or committer header",
            )),
        }
    }

    /// Replace the parent list.
    pub fn set_parents(&mut self, parents: Vec<String>) {
        self.parents = parents;
    }

    /// Serialize back to raw commit object bytes.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("tree {}\n", self.tree));
        for parent in &self.parents {
            out.push_str(&format!("parent {}\n", parent));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!("committer {}\n", self.committer));
        out.push('\n');
        out.push_str(&self.message);
        if !self.message.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

impl Repository {
    /// Read a commit object by hash.
    pub fn read_raw_commit(&self, commit: &str) -> Result<RawCommit> {
        let raw = self.runner().run_checked(&["cat-file", "commit", commit])?;
        RawCommit::parse(&raw)
    }

    /// Write a commit object, returning its hash.
    pub fn write_raw_commit(&self, commit: &RawCommit) -> Result<String> {
        let outcome = self.runner().run_with_stdin(
            &["hash-object", "-t", "commit", "-w", "--stdin"],
            commit.serialize().as_bytes(),
        )?;
        if !outcome.success() {
            anyhow::bail!("Failed to write commit object: {}", outcome.stderr.trim());
        }
        Ok(outcome.stdout.trim().to_string())
    }

    /// Create a genuinely empty commit: empty tree, no parents, fixed
    /// identity. Returns its hash.
    pub fn write_empty_commit(&self) -> Result<String> {
        let outcome = self.runner().run_with_stdin(&["mktree"], b"")?;
        if !outcome.success() {
            anyhow::bail!("Failed to write empty tree: {}", outcome.stderr.trim());
        }
        let empty_tree = outcome.stdout.trim().to_string();

        let commit = RawCommit {
            tree: empty_tree,
            parents: Vec::new(),
            author: EMPTY_IDENT.to_string(),
            committer: EMPTY_IDENT.to_string(),
            message: String::new(),
        };
        self.write_raw_commit(&commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
                          parent 1111111111111111111111111111111111111111\n\
                          parent 2222222222222222222222222222222222222222\n\
                          author Alice <alice@example.com> 1700000000 +0000\n\
                          committer Bob <bob@example.com> 1700000001 +0000\n\
                          \n\
                          Add the thing\n\
                          \n\
                          Longer body.\n";

    #[test]
    fn test_parse_headers_and_message() {
        let commit = RawCommit::parse(SAMPLE).unwrap();
        assert_eq!(commit.tree, "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(commit.parents.len(), 2);
        assert!(commit.author.starts_with("Alice"));
        assert!(commit.committer.starts_with("Bob"));
        assert!(commit.message.starts_with("Add the thing"));
        assert!(commit.message.contains("Longer body."));
    }

    #[test]
    fn test_parent_rewrite_round_trip() {
        let mut commit = RawCommit::parse(SAMPLE).unwrap();
        commit.set_parents(vec![]);

        let serialized = commit.serialize();
        assert!(!serialized.contains("parent "));

        let reparsed = RawCommit::parse(&serialized).unwrap();
        assert!(reparsed.parents.is_empty());
        assert_eq!(reparsed.tree, commit.tree);
        assert_eq!(reparsed.message.trim_end(), commit.message.trim_end());
    }

    #[test]
    fn test_parse_drops_signature() {
        let signed = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
                      author A <a@x> 0 +0000\n\
                      committer A <a@x> 0 +0000\n\
                      gpgsig -----BEGIN PGP SIGNATURE-----\n \
                      fake\n -----END PGP SIGNATURE-----\n\
                      \n\
                      msg\n";
        let commit = RawCommit::parse(signed).unwrap();
        assert!(!commit.serialize().contains("gpgsig"));
    }

    #[test]
    fn test_parse_rejects_garbage_header() {
        assert!(RawCommit::parse("tree\n\nmsg").is_err());
    }
}
