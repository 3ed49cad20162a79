use ms_tensor::{DType, Shape, Tensor};

use crate::batch::solve_batch;
use crate::config::DispatchConfig;
use crate::cost::cost_per_unit;
use crate::error::{Result, SolveError};
use crate::resolve::output_shape;

/// The two registered forms of the solve operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// A single `[n, n]` / `[n, k]` pair.
    MatrixSolve,
    /// Any number of pairs stacked along leading batch dimensions.
    BatchMatrixSolve,
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::MatrixSolve => "MatrixSolve",
            OpKind::BatchMatrixSolve => "BatchMatrixSolve",
        }
    }

    pub fn supports_batch(&self) -> bool {
        matches!(self, OpKind::BatchMatrixSolve)
    }

    pub fn from_name(name: &str) -> Option<OpKind> {
        match name {
            "MatrixSolve" => Some(OpKind::MatrixSolve),
            "BatchMatrixSolve" => Some(OpKind::BatchMatrixSolve),
            _ => None,
        }
    }
}

/// A registered (operation, scalar type) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelDef {
    pub op: OpKind,
    pub dtype: DType,
}

static KERNELS: [KernelDef; 4] = [
    KernelDef {
        op: OpKind::MatrixSolve,
        dtype: DType::F32,
    },
    KernelDef {
        op: OpKind::MatrixSolve,
        dtype: DType::F64,
    },
    KernelDef {
        op: OpKind::BatchMatrixSolve,
        dtype: DType::F32,
    },
    KernelDef {
        op: OpKind::BatchMatrixSolve,
        dtype: DType::F64,
    },
];

/// Every kernel this crate provides.
pub fn registered_kernels() -> &'static [KernelDef] {
    &KERNELS
}

/// Look up the kernel registered under `name` for `dtype`.
pub fn find_kernel(name: &str, dtype: DType) -> Option<&'static KernelDef> {
    KERNELS
        .iter()
        .find(|k| k.op.name() == name && k.dtype == dtype)
}

/// A configured solve operation, as handed to a batch executor.
#[derive(Debug, Clone)]
pub struct MatrixSolveOp {
    kind: OpKind,
    config: DispatchConfig,
}

impl MatrixSolveOp {
    pub fn new(kind: OpKind) -> Self {
        Self {
            kind,
            config: DispatchConfig::default(),
        }
    }

    /// Build the operation registered under `name`.
    pub fn from_name(name: &str) -> Result<Self> {
        OpKind::from_name(name)
            .map(Self::new)
            .ok_or_else(|| SolveError::UnknownOp(name.to_string()))
    }

    /// Replace the dispatch configuration. Returns self for builder-style usage.
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Shape of the solution tensor for the given operand shapes.
    pub fn output_shape(&self, input: &Shape, rhs: &Shape) -> Result<Shape> {
        output_shape(input, rhs)
    }

    /// Estimated cost of one pair of the given 2-D shapes.
    pub fn cost_per_unit(&self, input: &Shape, rhs: &Shape) -> u64 {
        cost_per_unit(input, rhs)
    }

    /// Solve every pair in `input` / `rhs`.
    pub fn compute(&self, input: &Tensor, rhs: &Tensor) -> Result<Tensor> {
        if find_kernel(self.kind.name(), input.dtype()).is_none() {
            return Err(SolveError::UnknownOp(format!(
                "{} for {}",
                self.kind.name(),
                input.dtype()
            )));
        }
        solve_batch(self.kind, input, rhs, &self.config)
    }
}
