//! # Acquisition Reader
//!
//! Inverse of [`crate::writer`]: reads the header block, then the arrays whose
//! extents it declares, building the chain `header → [trajectory] → samples`.
//!
//! The chain under construction is a local value. Any `?` return drops it,
//! which releases every node allocated for the record so far; the caller
//! either receives the complete chain or nothing.
//!
//! Extents are checked against [`WireLimits`] before allocation. After an
//! allocation failure the section is not read: the peer has already sent it,
//! so the stream is out of step and the connection must be closed.

use crate::constants::MessageId;
use crate::error::{Section, WireError, WireResult};
use crate::framing::recv_section;
use crate::interface::MessageReader;
use crate::limits::WireLimits;
use gadget_types::{Acquisition, AcquisitionHeader, Complex32, MessageChain, NdArray, Payload};
use std::io::Read;
use tracing::{debug, error};
use zerocopy::{AsBytes, FromZeroes};

/// Reader for [`MessageId::IsmrmrdAcquisition`] records
#[derive(Debug, Clone, Copy, Default)]
pub struct AcquisitionReader {
    limits: WireLimits,
}

impl AcquisitionReader {
    pub const ID: MessageId = MessageId::IsmrmrdAcquisition;
    pub const NAME: &'static str = "IsmrmrdAcquisitionReader";

    pub fn new(limits: WireLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> WireLimits {
        self.limits
    }

    /// Read one record; the identifier must already be consumed
    pub fn read_chain<R: Read + ?Sized>(&self, stream: &mut R) -> WireResult<MessageChain> {
        let mut header = Box::new(AcquisitionHeader::new_zeroed());
        recv_section(stream, Section::Header, header.as_mut().as_bytes_mut())?;

        let trajectory_dims = header.trajectory_dims();
        let sample_dims = header.sample_dims();
        let scan_counter = header.scan_counter;

        let mut chain = MessageChain::with_capacity(if trajectory_dims.is_some() { 3 } else { 2 });
        chain.push(Payload::AcquisitionHeader(header));

        if let Some(dims) = trajectory_dims {
            let mut trajectory = allocate::<f32>(
                Section::Trajectory,
                dims,
                self.limits.max_trajectory_elements,
            )?;
            recv_section(stream, Section::Trajectory, trajectory.as_bytes_mut())?;
            chain.push(Payload::Trajectory(trajectory));
        }

        let mut data =
            allocate::<Complex32>(Section::Samples, sample_dims, self.limits.max_sample_elements)?;
        recv_section(stream, Section::Samples, data.as_bytes_mut())?;
        chain.push(Payload::Samples(data));

        debug!(
            scan_counter,
            ?sample_dims,
            ?trajectory_dims,
            nodes = chain.len(),
            "Received acquisition"
        );
        Ok(chain)
    }

    /// Read one record as a typed [`Acquisition`]
    pub fn read_acquisition<R: Read + ?Sized>(&self, stream: &mut R) -> WireResult<Acquisition> {
        let chain = self.read_chain(stream)?;
        Acquisition::try_from(chain).map_err(|source| WireError::InvalidPayloadType {
            expected: Self::ID.name(),
            source,
        })
    }
}

impl MessageReader for AcquisitionReader {
    fn message_id(&self) -> MessageId {
        Self::ID
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, stream: &mut dyn Read) -> WireResult<MessageChain> {
        self.read_chain(stream)
    }
}

fn allocate<T: FromZeroes + Copy>(
    section: Section,
    dims: [usize; 2],
    max_elements: usize,
) -> WireResult<NdArray<T>> {
    NdArray::create_bounded(dims, max_elements).map_err(|e| {
        error!(%section, ?dims, error = %e, "Unable to allocate record buffer");
        WireError::allocation(section, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::AcquisitionWriter;
    use gadget_types::{AllocationError, PayloadKind};
    use std::io::Cursor;

    /// Encoded record with the identifier stripped, as the registry hands it over
    fn encode(acq: &Acquisition) -> Vec<u8> {
        let mut wire = Vec::new();
        AcquisitionWriter.write_acquisition(&mut wire, acq).unwrap();
        wire.split_off(2)
    }

    #[test]
    fn test_worked_example() {
        let mut acq = Acquisition::new(AcquisitionHeader::new(128, 4, 0)).unwrap();
        for (i, sample) in acq.data.as_mut_slice().iter_mut().enumerate() {
            *sample = Complex32::new(i as f32, -(i as f32));
        }
        let body = encode(&acq);
        assert_eq!(body.len(), AcquisitionHeader::SIZE + 4096);

        let chain = AcquisitionReader::default()
            .read_chain(&mut Cursor::new(body))
            .unwrap();
        assert_eq!(chain.kinds(), vec![PayloadKind::AcquisitionHeader, PayloadKind::Samples]);
        assert_eq!(chain.samples().unwrap().dims(), [128, 4]);
        assert_eq!(chain.samples().unwrap().get(5, 1), Some(&Complex32::new(133.0, -133.0)));
    }

    #[test]
    fn test_zero_samples_yield_empty_array() {
        let acq = Acquisition::new(AcquisitionHeader::new(0, 8, 0)).unwrap();
        let body = encode(&acq);
        assert_eq!(body.len(), AcquisitionHeader::SIZE);

        let chain = AcquisitionReader::default()
            .read_chain(&mut Cursor::new(body))
            .unwrap();
        let samples = chain.samples().unwrap();
        assert!(samples.is_empty());
        assert_eq!(samples.dims(), [0, 8]);
    }

    #[test]
    fn test_zero_samples_with_trajectory() {
        let acq = Acquisition::new(AcquisitionHeader::new(0, 2, 3)).unwrap();
        let chain = AcquisitionReader::default()
            .read_chain(&mut Cursor::new(encode(&acq)))
            .unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.trajectory().unwrap().dims(), [3, 0]);
    }

    #[test]
    fn test_short_header() {
        let err = AcquisitionReader::default()
            .read_chain(&mut Cursor::new(vec![0u8; AcquisitionHeader::SIZE - 1]))
            .unwrap_err();
        assert!(err.is_header_read_failure());
    }

    #[test]
    fn test_truncated_trajectory() {
        let acq = Acquisition::new(AcquisitionHeader::new(16, 2, 2)).unwrap();
        let mut body = encode(&acq);
        body.truncate(AcquisitionHeader::SIZE + 20);

        let err = AcquisitionReader::default()
            .read_chain(&mut Cursor::new(body))
            .unwrap_err();
        assert_eq!(err.section(), Some(Section::Trajectory));
        assert!(err.is_array_read_failure());
    }

    #[test]
    fn test_sample_failure_after_trajectory_releases_chain() {
        let acq = Acquisition::new(AcquisitionHeader::new(16, 2, 2)).unwrap();
        let mut body = encode(&acq);
        let trajectory_end = AcquisitionHeader::SIZE + 2 * 16 * 4;
        body.truncate(trajectory_end + 8);

        let mut stream = Cursor::new(body);
        let result = AcquisitionReader::default().read_chain(&mut stream);
        match result {
            Err(WireError::ConnectionIo {
                section: Section::Samples,
                ..
            }) => {}
            other => panic!("expected sample read failure, got {other:?}"),
        }
        // The trajectory was consumed before the failure
        assert!(stream.position() as usize >= trajectory_end);
    }

    #[test]
    fn test_limit_refuses_allocation_without_reading() {
        let acq = Acquisition::new(AcquisitionHeader::new(64, 4, 0)).unwrap();
        let reader = AcquisitionReader::new(WireLimits {
            max_trajectory_elements: 1024,
            max_sample_elements: 255,
        });

        let mut stream = Cursor::new(encode(&acq));
        let err = reader.read_chain(&mut stream).unwrap_err();
        assert!(matches!(
            err,
            WireError::Allocation {
                section: Section::Samples,
                source: AllocationError::ExceedsLimit { elements: 256, .. },
            }
        ));
        assert!(err.is_fatal());
        assert_eq!(stream.position() as usize, AcquisitionHeader::SIZE);
    }

    #[test]
    fn test_read_acquisition_typed() {
        let mut acq = Acquisition::new(AcquisitionHeader::new(4, 2, 2)).unwrap();
        acq.header.measurement_uid = 99;
        acq.trajectory
            .as_mut()
            .unwrap()
            .as_mut_slice()
            .iter_mut()
            .enumerate()
            .for_each(|(i, k)| *k = i as f32 * 0.25);

        let back = AcquisitionReader::default()
            .read_acquisition(&mut Cursor::new(encode(&acq)))
            .unwrap();
        assert_eq!(back, acq);
    }
}
