//! # Acquisition Writer
//!
//! Serializes one acquisition record as
//!
//! ```text
//! [u16 id][AcquisitionHeader, 344 B][f32 × traj_dims·samples]?[Complex32 × samples·channels]
//! ```
//!
//! Section sizes come only from header fields; nothing else on the wire says
//! how long the arrays are. Array nodes are checked against those fields
//! before the first byte goes out, so a mismatched record never produces a
//! partial frame. Once sending starts, the first failed section aborts the
//! record and the connection is unusable.

use crate::constants::MessageId;
use crate::error::{Section, WireError, WireResult};
use crate::framing::{send_section, write_identifier};
use crate::interface::MessageWriter;
use gadget_types::{Acquisition, AcquisitionHeader, Complex32, MessageChain, NdArray};
use std::io::Write;
use std::mem::size_of;
use tracing::debug;
use zerocopy::AsBytes;

/// Writer for [`MessageId::IsmrmrdAcquisition`] records
#[derive(Debug, Clone, Copy, Default)]
pub struct AcquisitionWriter;

impl AcquisitionWriter {
    pub const ID: MessageId = MessageId::IsmrmrdAcquisition;
    pub const NAME: &'static str = "IsmrmrdAcquisitionWriter";

    pub fn new() -> Self {
        Self
    }

    /// Write a chain laid out as `header → [trajectory] → samples`
    pub fn write_chain<W: Write + ?Sized>(
        &self,
        stream: &mut W,
        chain: &MessageChain,
    ) -> WireResult<()> {
        let parts = chain
            .acquisition_parts()
            .map_err(|source| WireError::InvalidPayloadType {
                expected: Self::ID.name(),
                source,
            })?;
        write_parts(stream, parts.header, parts.trajectory, parts.data)
    }

    /// Write a typed record
    pub fn write_acquisition<W: Write + ?Sized>(
        &self,
        stream: &mut W,
        acquisition: &Acquisition,
    ) -> WireResult<()> {
        write_parts(
            stream,
            &acquisition.header,
            acquisition.trajectory.as_ref(),
            &acquisition.data,
        )
    }
}

impl MessageWriter for AcquisitionWriter {
    fn message_id(&self) -> MessageId {
        Self::ID
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn write(&self, stream: &mut dyn Write, chain: &MessageChain) -> WireResult<()> {
        self.write_chain(stream, chain)
    }
}

fn write_parts<W: Write + ?Sized>(
    stream: &mut W,
    header: &AcquisitionHeader,
    trajectory: Option<&NdArray<f32>>,
    data: &NdArray<Complex32>,
) -> WireResult<()> {
    check_shapes(header, trajectory, data)?;

    let trajectory_elements = header.trajectory_elements();
    let data_elements = header.data_elements();

    write_identifier(stream, AcquisitionWriter::ID)?;
    send_section(stream, Section::Header, header.as_bytes())?;

    if trajectory_elements > 0 {
        if let Some(trajectory) = trajectory {
            let bytes = trajectory_elements * size_of::<f32>();
            send_section(stream, Section::Trajectory, &trajectory.as_bytes()[..bytes])?;
        }
    }

    if data_elements > 0 {
        let bytes = data_elements * size_of::<Complex32>();
        send_section(stream, Section::Samples, &data.as_bytes()[..bytes])?;
    }

    debug!(
        scan_counter = header.scan_counter,
        samples = header.number_of_samples,
        channels = header.active_channels,
        trajectory_elements,
        data_elements,
        "Sent acquisition"
    );
    Ok(())
}

/// Array nodes must have exactly the extents the header declares
fn check_shapes(
    header: &AcquisitionHeader,
    trajectory: Option<&NdArray<f32>>,
    data: &NdArray<Complex32>,
) -> WireResult<()> {
    let expected = header.trajectory_dims();
    let found = trajectory.map(NdArray::dims);
    if expected != found {
        return Err(WireError::PayloadShapeMismatch {
            section: Section::Trajectory,
            expected,
            found,
        });
    }

    let expected = header.sample_dims();
    if data.dims() != expected {
        return Err(WireError::PayloadShapeMismatch {
            section: Section::Samples,
            expected: Some(expected),
            found: Some(data.dims()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gadget_types::{ChainError, Payload};
    use std::io;

    /// Accepts `limit` bytes, then refuses everything
    struct ShortWriter {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.written.len();
            if room == 0 {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            let n = room.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_worked_example_byte_count() {
        let acq = Acquisition::new(AcquisitionHeader::new(128, 4, 0)).unwrap();
        let mut wire = Vec::new();
        AcquisitionWriter.write_acquisition(&mut wire, &acq).unwrap();
        assert_eq!(wire.len(), 2 + AcquisitionHeader::SIZE + 4096);
        assert_eq!(&wire[..2], &1008u16.to_ne_bytes());
    }

    #[test]
    fn test_trajectory_precedes_samples() {
        let mut acq = Acquisition::new(AcquisitionHeader::new(2, 1, 1)).unwrap();
        acq.trajectory
            .as_mut()
            .unwrap()
            .as_mut_slice()
            .copy_from_slice(&[-0.5, 0.5]);
        acq.data.as_mut_slice()[0] = Complex32::new(9.0, 8.0);

        let mut wire = Vec::new();
        AcquisitionWriter.write_acquisition(&mut wire, &acq).unwrap();

        let body = &wire[2 + AcquisitionHeader::SIZE..];
        assert_eq!(body.len(), 2 * 4 + 2 * 8);
        assert_eq!(&body[..4], &(-0.5f32).to_ne_bytes());
        assert_eq!(&body[8..12], &9.0f32.to_ne_bytes());
    }

    #[test]
    fn test_non_acquisition_chain_rejected() {
        let chain = MessageChain::new(Payload::Raw(vec![1, 2, 3]));
        let mut wire = Vec::new();
        let err = AcquisitionWriter.write_chain(&mut wire, &chain).unwrap_err();

        assert!(matches!(
            err,
            WireError::InvalidPayloadType {
                source: ChainError::UnexpectedPayload { position: 0, .. },
                ..
            }
        ));
        assert!(wire.is_empty());
    }

    #[test]
    fn test_shape_mismatch_sends_nothing() {
        let header = AcquisitionHeader::new(16, 2, 3);
        let chain = MessageChain::new(Payload::AcquisitionHeader(Box::new(header)))
            .then(Payload::Samples(NdArray::create([16, 2]).unwrap()));

        let mut wire = Vec::new();
        let err = AcquisitionWriter.write_chain(&mut wire, &chain).unwrap_err();
        assert!(matches!(
            err,
            WireError::PayloadShapeMismatch {
                section: Section::Trajectory,
                expected: Some([3, 16]),
                found: None,
            }
        ));
        assert!(wire.is_empty());

        let mut acq = Acquisition::new(AcquisitionHeader::new(16, 2, 0)).unwrap();
        acq.data = NdArray::create([16, 3]).unwrap();
        let err = AcquisitionWriter.write_acquisition(&mut wire, &acq).unwrap_err();
        assert!(matches!(
            err,
            WireError::PayloadShapeMismatch {
                section: Section::Samples,
                ..
            }
        ));
        assert!(wire.is_empty());
    }

    #[test]
    fn test_short_write_reports_section() {
        let acq = Acquisition::new(AcquisitionHeader::new(8, 2, 2)).unwrap();

        let cases = [
            (1, Section::Identifier),
            (2 + 100, Section::Header),
            (2 + AcquisitionHeader::SIZE + 10, Section::Trajectory),
            (2 + AcquisitionHeader::SIZE + 64 + 1, Section::Samples),
        ];
        for (limit, section) in cases {
            let mut stream = ShortWriter {
                written: Vec::new(),
                limit,
            };
            let err = AcquisitionWriter
                .write_acquisition(&mut stream, &acq)
                .unwrap_err();
            assert_eq!(err.section(), Some(section), "limit {limit}");
            assert!(err.is_fatal());
        }
    }
}
