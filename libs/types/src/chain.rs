//! Message chains: one logical record as an ordered run of typed payloads
//!
//! A chain replaces linked container blocks with an owned `Vec` of tagged
//! payloads. Each node is owned by the chain and the chain is moved, never
//! shared, between pipeline stages. Dropping a partially built chain releases
//! every node it holds.

use crate::acquisition::AcquisitionHeader;
use crate::array::{Complex32, NdArray};
use std::fmt;
use thiserror::Error;

/// One typed node of a chain
#[derive(Debug, PartialEq)]
pub enum Payload {
    AcquisitionHeader(Box<AcquisitionHeader>),
    Trajectory(NdArray<f32>),
    Samples(NdArray<Complex32>),
    /// Opaque bytes for message types this crate does not interpret
    Raw(Vec<u8>),
}

/// Discriminant of a [`Payload`], used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    AcquisitionHeader,
    Trajectory,
    Samples,
    Raw,
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::AcquisitionHeader(_) => PayloadKind::AcquisitionHeader,
            Payload::Trajectory(_) => PayloadKind::Trajectory,
            Payload::Samples(_) => PayloadKind::Samples,
            Payload::Raw(_) => PayloadKind::Raw,
        }
    }
}

impl PayloadKind {
    pub fn name(&self) -> &'static str {
        match self {
            PayloadKind::AcquisitionHeader => "AcquisitionHeader",
            PayloadKind::Trajectory => "Trajectory<f32>",
            PayloadKind::Samples => "Samples<Complex32>",
            PayloadKind::Raw => "Raw",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chain does not have the node layout the caller expects
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Empty message chain")]
    Empty,

    #[error("Unexpected payload at node {position}: expected {expected}, found {found}")]
    UnexpectedPayload {
        position: usize,
        expected: PayloadKind,
        found: PayloadKind,
    },

    #[error("Message chain ends before expected {expected} node")]
    MissingNode { expected: PayloadKind },

    #[error("Message chain has {count} unexpected trailing node(s)")]
    TrailingNodes { count: usize },
}

/// Ordered, exclusively owned sequence of payload nodes
#[derive(Debug, Default, PartialEq)]
pub struct MessageChain {
    nodes: Vec<Payload>,
}

/// Borrowed view of a chain laid out as an acquisition record
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionParts<'a> {
    pub header: &'a AcquisitionHeader,
    pub trajectory: Option<&'a NdArray<f32>>,
    pub data: &'a NdArray<Complex32>,
}

impl MessageChain {
    /// Start a chain with its head node
    pub fn new(head: Payload) -> Self {
        Self { nodes: vec![head] }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Link a node after the current tail
    pub fn push(&mut self, payload: Payload) {
        self.nodes.push(payload);
    }

    /// Builder-style [`MessageChain::push`]
    pub fn then(mut self, payload: Payload) -> Self {
        self.push(payload);
        self
    }

    pub fn head(&self) -> Option<&Payload> {
        self.nodes.first()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Payload> {
        self.nodes.iter()
    }

    pub fn kinds(&self) -> Vec<PayloadKind> {
        self.nodes.iter().map(Payload::kind).collect()
    }

    /// Give up the chain and take ownership of its nodes
    pub fn into_nodes(self) -> Vec<Payload> {
        self.nodes
    }

    pub fn acquisition_header(&self) -> Option<&AcquisitionHeader> {
        self.nodes.iter().find_map(|node| match node {
            Payload::AcquisitionHeader(header) => Some(header.as_ref()),
            _ => None,
        })
    }

    pub fn trajectory(&self) -> Option<&NdArray<f32>> {
        self.nodes.iter().find_map(|node| match node {
            Payload::Trajectory(array) => Some(array),
            _ => None,
        })
    }

    pub fn samples(&self) -> Option<&NdArray<Complex32>> {
        self.nodes.iter().find_map(|node| match node {
            Payload::Samples(array) => Some(array),
            _ => None,
        })
    }

    /// Check the `header → [trajectory] → samples` layout and borrow its parts
    ///
    /// Only the node order is checked here; extents against header fields are
    /// the writer's concern.
    pub fn acquisition_parts(&self) -> Result<AcquisitionParts<'_>, ChainError> {
        let mut nodes = self.nodes.iter().enumerate().peekable();

        let header = match nodes.next() {
            Some((_, Payload::AcquisitionHeader(header))) => header.as_ref(),
            Some((position, other)) => {
                return Err(ChainError::UnexpectedPayload {
                    position,
                    expected: PayloadKind::AcquisitionHeader,
                    found: other.kind(),
                })
            }
            None => return Err(ChainError::Empty),
        };

        let trajectory = match nodes.next_if(|(_, node)| matches!(node, Payload::Trajectory(_))) {
            Some((_, Payload::Trajectory(array))) => Some(array),
            _ => None,
        };

        let data = match nodes.next() {
            Some((_, Payload::Samples(array))) => array,
            Some((position, other)) => {
                return Err(ChainError::UnexpectedPayload {
                    position,
                    expected: PayloadKind::Samples,
                    found: other.kind(),
                })
            }
            None => {
                return Err(ChainError::MissingNode {
                    expected: PayloadKind::Samples,
                })
            }
        };

        let trailing = nodes.count();
        if trailing > 0 {
            return Err(ChainError::TrailingNodes { count: trailing });
        }

        Ok(AcquisitionParts {
            header,
            trajectory,
            data,
        })
    }
}

impl IntoIterator for MessageChain {
    type Item = Payload;
    type IntoIter = std::vec::IntoIter<Payload>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageChain {
    type Item = &'a Payload;
    type IntoIter = std::slice::Iter<'a, Payload>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
