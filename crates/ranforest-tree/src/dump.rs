//! Line-oriented text dump of a tree.
//!
//! The first line holds the node count. Each following line is one node:
//!
//! ```text
//! index status left right encoded threshold class
//! ```
//!
//! `status` is `1` for a split and `-1` for a terminal node. Terminal nodes
//! write `0 0` as their child links, `class - n_classes` as `encoded` and
//! their leaf value in the threshold column. Floats use the shortest decimal
//! that parses back to the same value, so a dump round-trips exactly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info, instrument};

use crate::error::TreeError;
use crate::node::{FeatureIndex, Node, NodeIndex, NodeStatus};
use crate::tree::RanTree;

impl RanTree {
    /// Write the text dump to `writer`.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from `writer`.
    pub fn write_dump<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_all(self.to_dump_string().as_bytes())
    }

    /// Render the text dump as a string.
    #[must_use]
    pub fn to_dump_string(&self) -> String {
        let mut out = String::with_capacity(16 + self.nodes.len() * 56);
        out.push_str(&format!("{:>5}\n", self.nodes.len()));
        for (index, node) in self.nodes.iter().enumerate() {
            let (left, right, number) = match node {
                Node::Split {
                    threshold,
                    left,
                    right,
                    ..
                } => (left.index(), right.index(), *threshold),
                Node::Terminal { value, .. } => (0, 0, *value),
            };
            out.push_str(&format!(
                "{index:>5}{:>5}{left:>5}{right:>5}{:>5}{:>24}{:>5}\n",
                node.status().code(),
                self.encode(node),
                format!(" {number:?}"),
                node.class(),
            ));
        }
        out
    }

    /// Parse a text dump produced by [`RanTree::to_dump_string`].
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ParseDump`] with the offending one-based line
    /// when the header disagrees with the record count, a field does not
    /// parse, a record index is out of sequence, a status is not `1`/`-1`,
    /// a split child does not point forward into the array, terminal codes
    /// imply inconsistent class counts, or a float is not finite.
    pub fn from_dump(text: &str) -> Result<Self, TreeError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (header_line, header) = lines.next().ok_or_else(|| parse_error(1, "empty dump"))?;
        let n_nodes: usize = header
            .parse()
            .map_err(|_| parse_error(header_line, format!("invalid node count {header:?}")))?;
        if n_nodes == 0 {
            return Err(parse_error(header_line, "a tree has at least one node"));
        }

        let records = lines
            .map(|(line, l)| Record::parse(line, l))
            .collect::<Result<Vec<_>, _>>()?;
        if records.len() != n_nodes {
            return Err(parse_error(
                header_line,
                format!("header declares {n_nodes} nodes, found {}", records.len()),
            ));
        }

        let n_classes = infer_n_classes(&records)?;

        let mut nodes = Vec::with_capacity(n_nodes);
        for (position, record) in records.iter().enumerate() {
            let line = record.line;
            if record.index != position {
                return Err(parse_error(
                    line,
                    format!("node index {} out of sequence, expected {position}", record.index),
                ));
            }
            if record.class >= n_classes {
                return Err(parse_error(
                    line,
                    format!("class {} not below class count {n_classes}", record.class),
                ));
            }
            if !record.number.is_finite() {
                return Err(parse_error(line, "non-finite threshold or leaf value"));
            }

            let node = match record.status {
                NodeStatus::Split => {
                    for child in [record.left, record.right] {
                        if child <= position || child >= n_nodes {
                            return Err(parse_error(
                                line,
                                format!("child {child} of node {position} is not in ({position}, {n_nodes})"),
                            ));
                        }
                    }
                    let feature = usize::try_from(record.encoded).map_err(|_| {
                        parse_error(line, format!("negative split feature {}", record.encoded))
                    })?;
                    Node::Split {
                        feature: FeatureIndex::new(feature),
                        threshold: record.number,
                        left: NodeIndex::new(record.left),
                        right: NodeIndex::new(record.right),
                        class: record.class,
                    }
                }
                NodeStatus::Terminal => Node::Terminal {
                    class: record.class,
                    value: record.number,
                },
            };
            nodes.push(node);
        }

        Ok(RanTree::from_nodes(nodes, n_classes))
    }

    /// Write the text dump to a file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::WriteDump`] | file creation or write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        let path = path.as_ref();
        let write_err = |e: std::io::Error| TreeError::WriteDump {
            path: path.to_path_buf(),
            source: e,
        };

        let mut writer = BufWriter::new(File::create(path).map_err(write_err)?);
        self.write_dump(&mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;

        info!(n_nodes = self.nodes.len(), "tree saved");

        Ok(())
    }

    /// Load a tree from a text dump file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ReadDump`] | file read failed |
    /// | [`TreeError::ParseDump`] | contents are not a valid dump |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let path = path.as_ref();

        let text = std::fs::read_to_string(path).map_err(|e| TreeError::ReadDump {
            path: path.to_path_buf(),
            source: e,
        })?;
        let tree = Self::from_dump(&text)?;

        debug!(
            n_nodes = tree.n_nodes(),
            n_classes = tree.n_classes(),
            "tree loaded"
        );

        Ok(tree)
    }
}

impl FromStr for RanTree {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_dump(s)
    }
}

/// One parsed dump line, before cross-record validation.
struct Record {
    line: usize,
    index: usize,
    status: NodeStatus,
    left: usize,
    right: usize,
    encoded: i64,
    number: f64,
    class: usize,
}

impl Record {
    fn parse(line: usize, text: &str) -> Result<Self, TreeError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let [index, status, left, right, encoded, number, class] = fields[..] else {
            return Err(parse_error(
                line,
                format!("expected 7 fields, found {}", fields.len()),
            ));
        };

        let status_code: i64 = field(line, "status", status)?;
        let status = NodeStatus::from_code(status_code)
            .ok_or_else(|| parse_error(line, format!("unknown node status {status_code}")))?;

        Ok(Self {
            line,
            index: field(line, "index", index)?,
            status,
            left: field(line, "left child", left)?,
            right: field(line, "right child", right)?,
            encoded: field(line, "encoded variable", encoded)?,
            number: field(line, "threshold", number)?,
            class: field(line, "class", class)?,
        })
    }
}

fn field<T: FromStr>(line: usize, name: &str, text: &str) -> Result<T, TreeError> {
    text.parse()
        .map_err(|_| parse_error(line, format!("invalid {name} {text:?}")))
}

/// Recover `n_classes` from terminal records, where `encoded = class - n_classes`.
fn infer_n_classes(records: &[Record]) -> Result<usize, TreeError> {
    let mut n_classes: Option<usize> = None;
    for record in records.iter().filter(|r| r.status == NodeStatus::Terminal) {
        if record.encoded >= 0 {
            return Err(parse_error(
                record.line,
                format!("terminal node has non-negative code {}", record.encoded),
            ));
        }
        let implied = i64::try_from(record.class)
            .ok()
            .and_then(|class| class.checked_sub(record.encoded))
            .and_then(|implied| usize::try_from(implied).ok())
            .ok_or_else(|| parse_error(record.line, "implied class count overflows"))?;
        match n_classes {
            None => n_classes = Some(implied),
            Some(n) if n != implied => {
                return Err(parse_error(
                    record.line,
                    format!("terminal code implies {implied} classes, earlier nodes imply {n}"),
                ));
            }
            Some(_) => {}
        }
    }
    n_classes.ok_or_else(|| parse_error(1, "dump has no terminal node"))
}

fn parse_error(line: usize, reason: impl Into<String>) -> TreeError {
    TreeError::ParseDump {
        line,
        reason: reason.into(),
    }
}
