use thiserror::Error;

const MAGIC: [u8; 4] = *b"RCWS";
const FORMAT_VERSION: u8 = 1;
const LSAVE_LEN: usize = 4;

/// Solver-private memory carried between handshake rounds.
///
/// The real buffer holds `(2m + 5)·n + 11m² + 8m` entries and the integer
/// buffer `3n`, alongside fixed-size save areas for the solver's scalar
/// state. Sizes are fixed at construction and cannot change afterwards.
///
/// The caller is the custodian: it keeps the workspace alive and untouched
/// between calls. Only a [`ReverseSolver`](super::ReverseSolver) reaches into
/// it, through [`Workspace::solver_view`]. To persist a run, use
/// [`Workspace::to_bytes`] and [`Workspace::from_bytes`], which round-trip
/// every bit.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    dimension: usize,
    corrections: usize,
    reals: Vec<f64>,
    integers: Vec<i64>,
    isave: Vec<i64>,
    dsave: Vec<f64>,
    lsave: [bool; LSAVE_LEN],
}

/// Mutable access to a workspace's buffers, for solver implementations.
///
/// Slices cannot be resized, so a solver can overwrite contents but never
/// change the workspace's shape.
#[derive(Debug)]
pub struct WorkspaceMut<'a> {
    /// `(2m + 5)·n + 11m² + 8m` reals.
    pub reals: &'a mut [f64],

    /// `3n` integers.
    pub integers: &'a mut [i64],

    /// Integer scalar save area.
    pub isave: &'a mut [i64],

    /// Real scalar save area.
    pub dsave: &'a mut [f64],

    /// Flag save area.
    pub lsave: &'a mut [bool],
}

/// Errors that can occur when creating or decoding a workspace.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("dimension must be positive")]
    EmptyProblem,

    #[error("correction count must be positive")]
    NoCorrections,

    #[error("workspace for n = {dimension}, m = {corrections} does not fit in memory")]
    TooLarge {
        dimension: usize,
        corrections: usize,
    },

    #[error("bytes do not start with a workspace header")]
    BadMagic,

    #[error("unsupported workspace format version {0}")]
    Version(u8),

    #[error("encoding has {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },

    #[error("flag byte {0} is neither 0 nor 1")]
    Flag(u8),
}

impl Workspace {
    /// Length of the integer scalar save area.
    pub const ISAVE_LEN: usize = 44;

    /// Length of the real scalar save area.
    pub const DSAVE_LEN: usize = 29;

    /// Length of the flag save area.
    pub const LSAVE_LEN: usize = LSAVE_LEN;

    const HEADER_LEN: usize = MAGIC.len() + 1 + 2 * 8;

    /// Allocates a zeroed workspace for `dimension` variables and
    /// `corrections` limited-memory pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if either size is zero or the buffers would overflow.
    pub fn new(dimension: usize, corrections: usize) -> Result<Self, WorkspaceError> {
        let (real_len, integer_len, _) = Self::layout(dimension, corrections)?;

        Ok(Self {
            dimension,
            corrections,
            reals: vec![0.0; real_len],
            integers: vec![0; integer_len],
            isave: vec![0; Self::ISAVE_LEN],
            dsave: vec![0.0; Self::DSAVE_LEN],
            lsave: [false; Self::LSAVE_LEN],
        })
    }

    /// Returns the real length, integer length, and encoded byte length.
    fn layout(
        dimension: usize,
        corrections: usize,
    ) -> Result<(usize, usize, usize), WorkspaceError> {
        if dimension == 0 {
            return Err(WorkspaceError::EmptyProblem);
        }
        if corrections == 0 {
            return Err(WorkspaceError::NoCorrections);
        }

        let too_large = WorkspaceError::TooLarge {
            dimension,
            corrections,
        };
        let real_len = Self::real_len(dimension, corrections).ok_or(too_large)?;
        let integer_len = Self::integer_len(dimension).ok_or(too_large)?;
        let encoded_len = Self::encoded_len(real_len, integer_len).ok_or(too_large)?;

        Ok((real_len, integer_len, encoded_len))
    }

    /// Returns `(2m + 5)·n + 11m² + 8m`, or `None` on overflow.
    #[must_use]
    pub fn real_len(dimension: usize, corrections: usize) -> Option<usize> {
        let (n, m) = (dimension, corrections);
        let per_variable = m.checked_mul(2)?.checked_add(5)?.checked_mul(n)?;
        let per_pair = m.checked_mul(m)?.checked_mul(11)?;
        per_variable
            .checked_add(per_pair)?
            .checked_add(m.checked_mul(8)?)
    }

    /// Returns `3n`, or `None` on overflow.
    #[must_use]
    pub fn integer_len(dimension: usize) -> Option<usize> {
        dimension.checked_mul(3)
    }

    fn encoded_len(real_len: usize, integer_len: usize) -> Option<usize> {
        let words = real_len
            .checked_add(integer_len)?
            .checked_add(Self::ISAVE_LEN + Self::DSAVE_LEN)?;
        words
            .checked_mul(8)?
            .checked_add(Self::HEADER_LEN + Self::LSAVE_LEN)
    }

    /// Returns the number of variables this workspace was sized for.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the number of corrections this workspace was sized for.
    #[must_use]
    pub fn corrections(&self) -> usize {
        self.corrections
    }

    /// Returns `true` if this workspace was sized for `n` variables and `m` corrections.
    #[must_use]
    pub fn fits(&self, dimension: usize, corrections: usize) -> bool {
        self.dimension == dimension && self.corrections == corrections
    }

    /// Borrows the buffers for a solver to read and write.
    ///
    /// Only solver implementations should call this. A driver that interprets
    /// or modifies these contents breaks the protocol.
    pub fn solver_view(&mut self) -> WorkspaceMut<'_> {
        WorkspaceMut {
            reals: &mut self.reals,
            integers: &mut self.integers,
            isave: &mut self.isave,
            dsave: &mut self.dsave,
            lsave: &mut self.lsave,
        }
    }

    /// Encodes the workspace, bit for bit, as little-endian bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let capacity = Self::encoded_len(self.reals.len(), self.integers.len()).unwrap_or(0);
        let mut out = Vec::with_capacity(capacity);

        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&(self.dimension as u64).to_le_bytes());
        out.extend_from_slice(&(self.corrections as u64).to_le_bytes());

        for value in self.reals.iter().chain(&self.dsave) {
            out.extend_from_slice(&value.to_bits().to_le_bytes());
        }
        for value in self.integers.iter().chain(&self.isave) {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend(self.lsave.iter().map(|&flag| u8::from(flag)));

        out
    }

    /// Decodes a workspace produced by [`Workspace::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns an error if the header is wrong, the sizes are invalid, the
    /// length does not match the sizes, or a flag byte is not 0 or 1.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkspaceError> {
        let mut reader = Reader { bytes, pos: 0 };

        if reader.take(MAGIC.len())? != MAGIC {
            return Err(WorkspaceError::BadMagic);
        }
        let version = reader.take(1)?[0];
        if version != FORMAT_VERSION {
            return Err(WorkspaceError::Version(version));
        }

        let dimension = reader.len_field()?;
        let corrections = reader.len_field()?;

        let (_, _, expected) = Self::layout(dimension, corrections)?;
        if bytes.len() != expected {
            return Err(WorkspaceError::Length {
                expected,
                actual: bytes.len(),
            });
        }
        let mut workspace = Self::new(dimension, corrections)?;

        for value in workspace.reals.iter_mut().chain(workspace.dsave.iter_mut()) {
            *value = f64::from_bits(reader.word()?);
        }
        for value in workspace
            .integers
            .iter_mut()
            .chain(workspace.isave.iter_mut())
        {
            *value = i64::from_le_bytes(reader.word()?.to_le_bytes());
        }
        for flag in &mut workspace.lsave {
            *flag = match reader.take(1)?[0] {
                0 => false,
                1 => true,
                other => return Err(WorkspaceError::Flag(other)),
            };
        }

        Ok(workspace)
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], WorkspaceError> {
        let end = self.pos.saturating_add(len);
        let chunk = self
            .bytes
            .get(self.pos..end)
            .ok_or(WorkspaceError::Length {
                expected: end,
                actual: self.bytes.len(),
            })?;
        self.pos = end;
        Ok(chunk)
    }

    fn word(&mut self) -> Result<u64, WorkspaceError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn len_field(&mut self) -> Result<usize, WorkspaceError> {
        let raw = self.word()?;
        usize::try_from(raw).map_err(|_| WorkspaceError::TooLarge {
            dimension: usize::MAX,
            corrections: usize::MAX,
        })
    }
}
