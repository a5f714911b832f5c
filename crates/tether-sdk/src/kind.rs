//! Element kinds and the scalar types stored in runtime vectors

/// Runtime representation a vector is specialized for.
///
/// Fixed when a vector is constructed; never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 32-bit integers (`NA_INTEGER` is the missing value)
    Integer,
    /// 64-bit floats (`NA_REAL` is the missing value)
    Real,
    /// Three-valued logicals
    Logical,
    /// Strings (missing is `None`)
    String,
    /// Pairs of 64-bit floats
    Complex,
    /// Generic list of handles
    Generic,
}

impl ElementKind {
    /// Name used in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::Integer => "integer",
            ElementKind::Real => "double",
            ElementKind::Logical => "logical",
            ElementKind::String => "character",
            ElementKind::Complex => "complex",
            ElementKind::Generic => "list",
        }
    }

    /// Whether the runtime offers contiguous region reads for this kind
    pub const fn supports_region(self) -> bool {
        matches!(
            self,
            ElementKind::Integer | ElementKind::Real | ElementKind::Logical | ElementKind::Complex
        )
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Missing integer
pub const NA_INTEGER: i32 = i32::MIN;

/// Missing logical in the runtime's i32 storage
pub const NA_LOGICAL: i32 = i32::MIN;

/// Missing real: a NaN carrying payload 1954 in the low word
pub const NA_REAL: f64 = f64::from_bits(0x7FF0_0000_0000_07A2);

/// True if `x` is the missing real (not just any NaN)
#[inline]
pub fn is_na_real(x: f64) -> bool {
    x.is_nan() && (x.to_bits() & 0xFFFF_FFFF) == 1954
}

/// Three-valued logical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Logical {
    /// FALSE
    #[default]
    False,
    /// TRUE
    True,
    /// Missing
    Na,
}

impl Logical {
    /// Decode the runtime's i32 storage
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            NA_LOGICAL => Logical::Na,
            0 => Logical::False,
            _ => Logical::True,
        }
    }

    /// Encode into the runtime's i32 storage
    #[inline]
    pub const fn to_raw(self) -> i32 {
        match self {
            Logical::False => 0,
            Logical::True => 1,
            Logical::Na => NA_LOGICAL,
        }
    }

    /// Check for the missing value
    #[inline]
    pub const fn is_na(self) -> bool {
        matches!(self, Logical::Na)
    }
}

impl From<bool> for Logical {
    fn from(b: bool) -> Self {
        if b {
            Logical::True
        } else {
            Logical::False
        }
    }
}

/// Complex number as stored by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    /// Real part
    pub re: f64,
    /// Imaginary part
    pub im: f64,
}

impl Complex {
    /// Missing complex (both parts `NA_REAL`)
    pub const NA: Complex = Complex {
        re: NA_REAL,
        im: NA_REAL,
    };

    /// Create a complex number
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Check for the missing value
    pub fn is_na(&self) -> bool {
        is_na_real(self.re) || is_na_real(self.im)
    }
}
