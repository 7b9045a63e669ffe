use crate::error::RuntimeError;
use crate::port::OutputPort;
use crate::value::Value;

/// A `depth` x `width` memory with one read port and one write port,
/// modeling Verilog single-clock memory semantics.
///
/// Grounded on `original_source/lib/oddf/src/blocks/memory.cpp`'s
/// `memory_block<T>`. Input layout (fixed, matches the port order built by
/// the factory that constructs this block): `[clkEnable, rdAddress,
/// wrAddress, wrEnable, wrDataIn_0 .. wrDataIn_{width-1}]`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Memory {
    depth: usize,
    width: usize,
    storage: Vec<Value>,
    output_register: Vec<Value>,
    default: Value,
    path: String,
}

impl Memory {
    pub fn new(path: impl Into<String>, depth: usize, width: usize, fill: Value) -> Self {
        Memory {
            depth,
            width,
            storage: vec![fill.clone(); depth * width],
            output_register: vec![fill.clone(); width],
            default: fill,
            path: path.into(),
        }
    }

    /// Publishes the output register unconditionally, matching the live
    /// (non-dead-code) path in `memory_block<T>::Evaluate`.
    pub fn evaluate(&self, outputs: &mut [OutputPort]) {
        for (out, v) in outputs.iter_mut().zip(self.output_register.iter()) {
            out.value = v.clone();
        }
    }

    fn check_address(&self, raw: i64) -> Result<usize, RuntimeError> {
        if raw < 0 || raw as usize >= self.depth {
            return Err(RuntimeError::AddressOutOfRange {
                path: self.path.clone(),
                address: raw,
                depth: self.depth,
            });
        }
        Ok(raw as usize)
    }

    /// `inputs` follows the layout documented on the type. Returns whether
    /// the block became dirty: unconditionally true once `clkEnable` is
    /// asserted, matching `memory_block<T>::Step`'s unconditional
    /// `SetDirty()` call rather than conditioning it on whether the read
    /// address changed.
    pub fn step(&mut self, inputs: &[Value]) -> Result<bool, RuntimeError> {
        let clk_enable = inputs[0].as_bool().unwrap_or(false);
        if !clk_enable {
            return Ok(false);
        }

        let rd_address = self.check_address(inputs[1].as_address().unwrap_or(0))?;
        self.output_register
            .clone_from_slice(&self.storage[rd_address * self.width..(rd_address + 1) * self.width]);

        let wr_enable = inputs[3].as_bool().unwrap_or(false);
        if wr_enable {
            let wr_address = self.check_address(inputs[2].as_address().unwrap_or(0))?;
            let wr_data = &inputs[4..4 + self.width];
            self.storage[wr_address * self.width..(wr_address + 1) * self.width].clone_from_slice(wr_data);
        }

        Ok(true)
    }

    /// Resets the output register to its fill value; `storage` is left
    /// untouched, matching Verilog memory semantics where only the read
    /// register, not the array itself, carries reset logic.
    pub fn async_reset(&mut self) {
        self.output_register.fill(self.default.clone());
    }

    /// Backdoor read for host tooling (initializers, debuggers), mirroring
    /// the C++ source's non-simulated accessor methods.
    pub fn backdoor_read(&self, address: usize) -> &[Value] {
        &self.storage[address * self.width..(address + 1) * self.width]
    }

    /// Backdoor write for host tooling.
    pub fn backdoor_write(&mut self, address: usize, data: &[Value]) {
        self.storage[address * self.width..(address + 1) * self.width].clone_from_slice(data);
    }
}
