//! Xenos register state consumed by uploads.
//!
//! Only a handful of registers matter here: the shader constant blocks (uploaded verbatim) and
//! the primitive-restart controls (which change how index buffers are converted).

/// `PA_SU_SC_MODE_CNTL`; bit [`PRIM_RESET_ENABLE_BIT`] enables multi-primitive index reset.
pub const PA_SU_SC_MODE_CNTL: u32 = 0x2205;
pub const PRIM_RESET_ENABLE_BIT: u32 = 1 << 21;
/// `VGT_MULTI_PRIM_IB_RESET_INDX`: the guest's primitive-restart index value.
pub const VGT_MULTI_PRIM_IB_RESET_INDX: u32 = 0x2105;

/// First of 512 float4 shader constants (`c0.x`).
pub const SHADER_CONSTANT_000_X: u32 = 0x4000;
/// First of 8 words holding 256 boolean constants.
pub const SHADER_CONSTANT_BOOL_000_031: u32 = 0x4900;
/// First of 32 loop constants.
pub const SHADER_CONSTANT_LOOP_00: u32 = 0x4908;

pub const FLOAT_CONSTANT_WORDS: usize = 512 * 4;
pub const BOOL_CONSTANT_WORDS: usize = 8;
pub const LOOP_CONSTANT_WORDS: usize = 32;

/// Size of the register file snapshot, in 32-bit registers.
pub const REGISTER_COUNT: usize = 0x5003;

/// Read-only view of the current register values.
///
/// Values are raw 32-bit words; float registers are reinterpreted with [`f32::from_bits`].
pub trait RegisterFile {
    fn value(&self, reg: u32) -> u32;

    /// `count` consecutive registers starting at `first`.
    fn values(&self, first: u32, count: usize) -> &[u32];

    fn value_f32(&self, reg: u32) -> f32 {
        f32::from_bits(self.value(reg))
    }
}

/// Primitive restart state as it affects index conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveRestart {
    pub enabled: bool,
    pub index: u32,
}

impl PrimitiveRestart {
    pub fn from_registers(regs: &dyn RegisterFile) -> Self {
        Self {
            enabled: regs.value(PA_SU_SC_MODE_CNTL) & PRIM_RESET_ENABLE_BIT != 0,
            index: regs.value(VGT_MULTI_PRIM_IB_RESET_INDX),
        }
    }
}

/// A plain copy of the register file.
#[derive(Clone)]
pub struct RegisterSnapshot {
    values: Box<[u32]>,
}

impl Default for RegisterSnapshot {
    fn default() -> Self {
        Self {
            values: vec![0u32; REGISTER_COUNT].into_boxed_slice(),
        }
    }
}

impl std::fmt::Debug for RegisterSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterSnapshot")
            .field("len", &self.values.len())
            .finish()
    }
}

impl RegisterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, reg: u32, value: u32) {
        self.values[reg as usize] = value;
    }

    pub fn set_f32(&mut self, reg: u32, value: f32) {
        self.set(reg, value.to_bits());
    }

    pub fn set_primitive_restart(&mut self, restart: PrimitiveRestart) {
        let cntl = self.value(PA_SU_SC_MODE_CNTL);
        let cntl = if restart.enabled {
            cntl | PRIM_RESET_ENABLE_BIT
        } else {
            cntl & !PRIM_RESET_ENABLE_BIT
        };
        self.set(PA_SU_SC_MODE_CNTL, cntl);
        self.set(VGT_MULTI_PRIM_IB_RESET_INDX, restart.index);
    }
}

impl RegisterFile for RegisterSnapshot {
    fn value(&self, reg: u32) -> u32 {
        self.values[reg as usize]
    }

    fn values(&self, first: u32, count: usize) -> &[u32] {
        let first = first as usize;
        &self.values[first..first + count]
    }
}
