//! Typed acquisition record and its chain conversions

use super::header::AcquisitionHeader;
use crate::array::{AllocationError, Complex32, NdArray};
use crate::chain::{ChainError, MessageChain, Payload, PayloadKind};

/// One complete acquisition: header, optional trajectory and samples
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub header: AcquisitionHeader,
    pub trajectory: Option<NdArray<f32>>,
    pub data: NdArray<Complex32>,
}

impl Acquisition {
    /// Allocate zero-filled arrays shaped by the header
    pub fn new(header: AcquisitionHeader) -> Result<Self, AllocationError> {
        let trajectory = header
            .trajectory_dims()
            .map(NdArray::<f32>::create)
            .transpose()?;
        let data = NdArray::create(header.sample_dims())?;

        Ok(Self {
            header,
            trajectory,
            data,
        })
    }

    /// Number of nodes this record occupies as a chain
    pub fn node_count(&self) -> usize {
        if self.trajectory.is_some() {
            3
        } else {
            2
        }
    }
}

impl From<Acquisition> for MessageChain {
    fn from(acquisition: Acquisition) -> Self {
        let mut chain = MessageChain::with_capacity(acquisition.node_count());
        chain.push(Payload::AcquisitionHeader(Box::new(acquisition.header)));
        if let Some(trajectory) = acquisition.trajectory {
            chain.push(Payload::Trajectory(trajectory));
        }
        chain.push(Payload::Samples(acquisition.data));
        chain
    }
}

impl TryFrom<MessageChain> for Acquisition {
    type Error = ChainError;

    fn try_from(chain: MessageChain) -> Result<Self, Self::Error> {
        chain.acquisition_parts()?;

        let mut header = None;
        let mut trajectory = None;
        let mut data = None;
        for node in chain {
            match node {
                Payload::AcquisitionHeader(h) => header = Some(*h),
                Payload::Trajectory(t) => trajectory = Some(t),
                Payload::Samples(s) => data = Some(s),
                Payload::Raw(_) => {}
            }
        }

        Ok(Self {
            header: header.ok_or(ChainError::Empty)?,
            trajectory,
            data: data.ok_or(ChainError::MissingNode {
                expected: PayloadKind::Samples,
            })?,
        })
    }
}
