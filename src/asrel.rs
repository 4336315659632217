// DOVESIM: Vanilla BGP Path Inference and Dovetail Path Sampling on the AS Graph
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Ingestion of CAIDA AS-relationship files.
//!
//! A relationship file is a text file with one record per line, fields
//! pipe-delimited: `asnA|asnB|indicator`. Indicator `-1` marks A as the
//! provider of B, `0` marks a peer-to-peer link. Lines starting with `#` are
//! comments. The parser produces a flat record list ([`AsRelLine`]) from
//! which both the BGP solver's adjacency list and the Dovetail pathlet graph
//! are built.

use std::{
    collections::BTreeSet,
    io::{self, BufRead, Write},
};

use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use thiserror::Error;

use crate::AsNumber;

/// The role a neighbor plays from the perspective of the AS owning the
/// adjacency entry. `Sibling` is reserved: the parser never produces it and
/// the solver never consumes it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Relationship {
    Customer,
    Provider,
    Peer,
    Sibling,
}

/// One directed adjacency entry: `asn` is the neighbor, `rel` is the
/// neighbor's role as seen from the entry's owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdjListElem {
    pub asn: AsNumber,
    pub rel: Relationship,
}

/// Adjacency list of the AS graph. A provider-customer link is stored as two
/// reciprocal directed entries with opposite tags; a peer link as two
/// symmetric `Peer` entries.
pub type AdjList = HashMap<AsNumber, Vec<AdjListElem>>;

/// Undirected link type of a single relationship record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LinkType {
    /// `x` is the provider, `y` the customer.
    ProviderCustomer,
    /// `x` and `y` peer with each other.
    PeerPeer,
}

/// One relationship record as it appears in the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsRelLine {
    pub x: AsNumber,
    pub y: AsNumber,
    pub link: LinkType,
}

#[derive(Debug, Error)]
pub enum AsrelError {
    #[error("i/o error while reading relationship data: {0}")]
    Io(#[from] io::Error),
    #[error("malformed relationship line {line:?}")]
    MalformedLine { line: String },
    #[error("unknown relationship indicator {indicator:?} in line {line:?}")]
    UnknownIndicator { indicator: String, line: String },
}

/// Parse a CAIDA AS-relationship stream into its flat record list.
///
/// Comment lines and empty lines are skipped. Trailing fields beyond the
/// third (present in some CAIDA serial-2 files) are ignored.
pub fn parse_asrel<R: BufRead>(reader: R) -> Result<Vec<AsRelLine>, AsrelError> {
    let mut lines = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('|');
        let (Some(x), Some(y), Some(indicator)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(AsrelError::MalformedLine { line });
        };

        let link = match indicator {
            "-1" => LinkType::ProviderCustomer,
            "0" => LinkType::PeerPeer,
            _ => {
                return Err(AsrelError::UnknownIndicator {
                    indicator: indicator.to_string(),
                    line: line.clone(),
                })
            }
        };

        lines.push(AsRelLine {
            x: x.to_string(),
            y: y.to_string(),
            link,
        });
    }

    Ok(lines)
}

/// Build the solver's adjacency list from parsed relationship records.
pub fn build_adj_list(lines: &[AsRelLine]) -> AdjList {
    let mut adj_list = AdjList::new();

    for line in lines {
        match line.link {
            LinkType::ProviderCustomer => {
                adj_list.entry(line.x.clone()).or_default().push(AdjListElem {
                    asn: line.y.clone(),
                    rel: Relationship::Customer,
                });
                adj_list.entry(line.y.clone()).or_default().push(AdjListElem {
                    asn: line.x.clone(),
                    rel: Relationship::Provider,
                });
            }
            LinkType::PeerPeer => {
                adj_list.entry(line.x.clone()).or_default().push(AdjListElem {
                    asn: line.y.clone(),
                    rel: Relationship::Peer,
                });
                adj_list.entry(line.y.clone()).or_default().push(AdjListElem {
                    asn: line.x.clone(),
                    rel: Relationship::Peer,
                });
            }
        }
    }

    adj_list
}

/// Serialize an adjacency list back to CAIDA line format.
///
/// Each provider-customer link is emitted once from the provider's `Customer`
/// entry; each peer link once from the lexicographically smaller endpoint.
/// Output is sorted, so serializing a parsed file is deterministic.
pub fn write_asrel<W: Write>(adj_list: &AdjList, mut out: W) -> io::Result<()> {
    for asn in adj_list.keys().sorted() {
        for elem in &adj_list[asn] {
            match elem.rel {
                Relationship::Customer => writeln!(out, "{asn}|{}|-1", elem.asn)?,
                Relationship::Peer if *asn < elem.asn => {
                    writeln!(out, "{asn}|{}|0", elem.asn)?
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// All ASes mentioned on either side of a relationship record.
pub fn unique_ases(lines: &[AsRelLine]) -> BTreeSet<AsNumber> {
    lines
        .iter()
        .flat_map(|line| [line.x.clone(), line.y.clone()])
        .collect()
}

/// Endhost ASes: customers that never appear as a provider, i.e. the leaves
/// of the customer-provider DAG. Peer links do not affect the result.
pub fn find_endhost_ases(lines: &[AsRelLine]) -> BTreeSet<AsNumber> {
    let mut providers = BTreeSet::new();
    let mut customers = BTreeSet::new();

    for line in lines {
        if line.link == LinkType::ProviderCustomer {
            providers.insert(line.x.clone());
            customers.insert(line.y.clone());
        }
    }

    customers.difference(&providers).cloned().collect()
}

#[cfg(test)]
mod test {
    use super::*;

    const ASREL: &str = "\
# comment line
1|2|-1
2|3|-1
2|4|0
";

    fn parsed() -> Vec<AsRelLine> {
        parse_asrel(ASREL.as_bytes()).unwrap()
    }

    #[test]
    fn parse_skips_comments_and_reads_links() {
        let lines = parsed();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].x, "1");
        assert_eq!(lines[0].y, "2");
        assert_eq!(lines[0].link, LinkType::ProviderCustomer);
        assert_eq!(lines[2].link, LinkType::PeerPeer);
    }

    #[test]
    fn parse_rejects_unknown_indicator() {
        let err = parse_asrel("1|2|7\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AsrelError::UnknownIndicator { .. }));
    }

    #[test]
    fn parse_rejects_missing_fields() {
        let err = parse_asrel("1|2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AsrelError::MalformedLine { .. }));
    }

    #[test]
    fn adj_list_is_reciprocal() {
        let adj_list = build_adj_list(&parsed());

        let has = |owner: &str, asn: &str, rel: Relationship| {
            adj_list[owner]
                .iter()
                .any(|e| e.asn == asn && e.rel == rel)
        };

        assert!(has("1", "2", Relationship::Customer));
        assert!(has("2", "1", Relationship::Provider));
        assert!(has("2", "3", Relationship::Customer));
        assert!(has("3", "2", Relationship::Provider));
        assert!(has("2", "4", Relationship::Peer));
        assert!(has("4", "2", Relationship::Peer));
    }

    #[test]
    fn roundtrip_preserves_adj_list() {
        let adj_list = build_adj_list(&parsed());

        let mut serialized = Vec::new();
        write_asrel(&adj_list, &mut serialized).unwrap();

        let reparsed = build_adj_list(&parse_asrel(serialized.as_slice()).unwrap());

        assert_eq!(adj_list.len(), reparsed.len());
        for (asn, elems) in &adj_list {
            let mut lhs = elems.clone();
            let mut rhs = reparsed[asn].clone();
            let key = |e: &AdjListElem| (e.asn.clone(), e.rel as u8);
            lhs.sort_by_key(key);
            rhs.sort_by_key(key);
            assert_eq!(lhs, rhs);
        }
    }

    #[test]
    fn endhosts_are_customer_leaves() {
        let endhosts = find_endhost_ases(&parsed());
        // 3 is a pure customer; 4 only peers and is no endhost.
        assert_eq!(endhosts.into_iter().collect::<Vec<_>>(), vec!["3"]);
    }

    #[test]
    fn unique_ases_collects_both_sides() {
        let ases = unique_ases(&parsed());
        assert_eq!(
            ases.into_iter().collect::<Vec<_>>(),
            vec!["1", "2", "3", "4"]
        );
    }
}
