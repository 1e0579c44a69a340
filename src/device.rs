//! S5i device
//!
//! Owns the per-module synthesizer state (frequency, stepsize,
//! reference, output configuration) and the 6-word register image, and
//! pushes that image over the rack bus. The bus handle only has to
//! implement the blocking SPI [`Write`] trait; module selection,
//! mode/speed tagging and serialization between modules sharing one
//! controller all live behind that implementation.

use embedded_hal::blocking::spi::Write;

use crate::constants::*;
use crate::errors::*;
use crate::frequency::{self, FrequencyPlan};
use crate::register::*;

/// Reference clock feeding the R counter
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReferenceSource {
    /// On-board 10 MHz oscillator
    Internal,
    /// Backplane reference distributed by the rack controller
    External,
}

/// S5i RF source module
pub struct S5i<SPI> {
    spi: SPI,
    frequency: u64,
    stepsize: u64,
    ref_frequency: u32,
    ref_source: ReferenceSource,
    output_enabled: bool,
    output_level: OutputLevel,
    registers: RegisterSet,
}

impl<SPI, E> S5i<SPI>
where
    SPI: Write<u8, Error = E>,
{
    /// Creates the device handle (nothing is written yet).
    ///
    /// Starts from the original power-up state: 100 MHz output on a
    /// 1 MHz grid from the internal 10 MHz reference, output enabled
    /// at full power. Call [`init`](S5i::init) to program the chip.
    pub fn new(spi: SPI) -> Self {
        S5i {
            spi,
            frequency: STARTUP_FREQUENCY,
            stepsize: DEFAULT_STEPSIZE,
            ref_frequency: INTERNAL_REF_FREQUENCY,
            ref_source: ReferenceSource::Internal,
            output_enabled: true,
            output_level: OutputLevel::Plus5dBm,
            registers: RegisterSet::power_up_defaults(),
        }
    }

    /// Plans the startup frequency and programs the full register set.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.set_frequency(self.frequency)
    }

    /// Sets the output frequency on the current stepsize grid.
    ///
    /// The register image is only replaced once the whole plan has
    /// validated; on any planning error the previous configuration
    /// stays in place and nothing is transmitted.
    pub fn set_frequency(&mut self, frequency: u64) -> Result<(), Error<E>> {
        let plan = FrequencyPlan::on_grid(frequency, self.stepsize, self.ref_frequency)?;
        self.commit(frequency, &plan)
    }

    /// Sets the output to the closest frequency reachable from the
    /// reference, ignoring the stepsize grid.
    ///
    /// Never fails for an in-range request: when the exact frequency
    /// cannot be produced, the best-fit divider pair is programmed
    /// instead and the snapped frequency is returned.
    pub fn set_frequency_optimally(&mut self, frequency: u64) -> Result<u64, Error<E>> {
        let (plan, actual) = FrequencyPlan::closest(frequency, self.ref_frequency)?;
        self.commit(actual, &plan)?;
        Ok(actual)
    }

    /// Sets the grid stepsize used by [`set_frequency`](S5i::set_frequency).
    ///
    /// The reference divided by the stepsize becomes the R counter, so
    /// the ratio must be an exact integer no larger than 1023. Takes
    /// effect on the next frequency change; nothing is written.
    pub fn set_stepsize(&mut self, stepsize: u64) -> Result<(), Error<E>> {
        let reference = u64::from(self.ref_frequency);
        if stepsize == 0 || reference % stepsize != 0 || reference / stepsize > R_MAX {
            return Err(Error::InvalidStepsize);
        }
        self.stepsize = stepsize;
        Ok(())
    }

    /// Stepsize implied by the lowest-noise plan for `frequency`, in Hz.
    pub fn optimal_stepsize(&self, frequency: u64) -> Result<u64, Error<E>> {
        Ok(frequency::optimal_stepsize(frequency, self.ref_frequency)?)
    }

    /// Soft-enables or disables the RF output stage.
    ///
    /// This is the enable bit of the generator IC, not the mute input
    /// on the module front; it attenuates less and switches slower.
    pub fn enable_output(&mut self, enable: bool) -> Result<(), Error<E>> {
        self.registers = self.registers.set(output_enable_flag(enable));
        self.output_enabled = enable;
        self.write_registers()
    }

    /// Sets the RF output power at the chip pin.
    pub fn set_output_power(&mut self, level: OutputLevel) -> Result<(), Error<E>> {
        self.registers = self.registers.set(level);
        self.output_level = level;
        self.write_registers()
    }

    /// Switches the R counter input to the backplane reference.
    ///
    /// The new reference only takes part in planning; registers are
    /// rewritten on the next frequency change. A previously configured
    /// stepsize may no longer divide the new reference, in which case
    /// [`set_frequency`](S5i::set_frequency) reports `InvalidStepsize`.
    pub fn use_external_reference(&mut self, ref_frequency: u32) -> Result<(), Error<E>> {
        if ref_frequency == 0 {
            return Err(Error::OutOfRange);
        }
        self.ref_source = ReferenceSource::External;
        self.ref_frequency = ref_frequency;
        Ok(())
    }

    /// Switches the R counter input back to the on-board 10 MHz
    /// oscillator.
    pub fn use_internal_reference(&mut self) {
        self.ref_source = ReferenceSource::Internal;
        self.ref_frequency = INTERNAL_REF_FREQUENCY;
    }

    /// Writes the register image out, REG5 down to REG0, each word as
    /// 4 big-endian bytes. The chip latches the new configuration on
    /// the REG0 write only, so a completed call switches the output in
    /// one step. Write-only; a bus error aborts the remaining words.
    pub fn write_registers(&mut self) -> Result<(), Error<E>> {
        for w in self.registers.to_words().iter().rev() {
            let data = [
                ((w >> 24) & 0xFF) as u8,
                ((w >> 16) & 0xFF) as u8,
                ((w >> 8) & 0xFF) as u8,
                (w & 0xFF) as u8,
            ];
            self.spi.write(&data).map_err(Error::Bus)?;
        }
        Ok(())
    }

    /// Currently programmed output frequency, Hz
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Current grid stepsize, Hz
    pub fn stepsize(&self) -> u64 {
        self.stepsize
    }

    /// Current reference frequency, Hz
    pub fn reference_frequency(&self) -> u32 {
        self.ref_frequency
    }

    /// Current reference source
    pub fn reference_source(&self) -> ReferenceSource {
        self.ref_source
    }

    /// RF output soft-enable state
    pub fn output_enabled(&self) -> bool {
        self.output_enabled
    }

    /// RF output power level
    pub fn output_level(&self) -> OutputLevel {
        self.output_level
    }

    /// Register image of the last committed plan
    pub fn registers(&self) -> &RegisterSet {
        &self.registers
    }

    /// Releases the bus handle.
    pub fn free(self) -> SPI {
        self.spi
    }

    fn commit(&mut self, frequency: u64, plan: &FrequencyPlan) -> Result<(), Error<E>> {
        self.registers = plan
            .apply(self.registers)
            .set(output_enable_flag(self.output_enabled));
        self.frequency = frequency;
        self.write_registers()
    }
}

fn output_enable_flag(enable: bool) -> RfOutputEnable {
    if enable {
        RfOutputEnable::Enabled
    } else {
        RfOutputEnable::Disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every bus write as one frame
    #[derive(Default)]
    struct BusSpy {
        frames: Vec<Vec<u8>>,
        fail: bool,
    }

    impl Write<u8> for BusSpy {
        type Error = ();

        fn write(&mut self, words: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.frames.push(words.to_vec());
            Ok(())
        }
    }

    fn device() -> S5i<BusSpy> {
        S5i::new(BusSpy::default())
    }

    #[test]
    fn init_programs_the_original_startup_words() {
        let mut s5i = device();
        s5i.init().unwrap();
        // 100 MHz on a 1 MHz grid from 10 MHz: divider 2^5,
        // R = 10, INT = 100, band select 100
        let words = s5i.registers().to_words();
        assert_eq!(words[0], 100 << 15);
        assert_eq!(words[1], (1 << 15) | (2 << 3) | 1);
        assert_eq!(
            words[2],
            (10 << 14) | (1 << 13) | (7 << 9) | (1 << 8) | (1 << 7) | (1 << 6) | 2
        );
        assert_eq!(words[3], (1 << 22) | (1 << 21) | 3);
        assert_eq!(
            words[4],
            (5 << 20) | (100 << 12) | (1 << 5) | (3 << 3) | 4
        );
        assert_eq!(words[5], (1 << 22) | (3 << 19) | 5);
    }

    #[test]
    fn registers_go_out_reg5_down_to_reg0_big_endian() {
        let mut s5i = device();
        s5i.set_frequency(1_000_000_000).unwrap();
        let words = s5i.registers().to_words();
        let frames = s5i.free().frames;
        assert_eq!(frames.len(), 6);
        for (frame, idx) in frames.iter().zip((0..6).rev()) {
            let w = words[idx];
            assert_eq!(frame.len(), 4);
            assert_eq!(frame[3] & 0b111, idx as u8);
            assert_eq!(
                frame,
                &[
                    (w >> 24) as u8,
                    (w >> 16) as u8,
                    (w >> 8) as u8,
                    w as u8
                ]
            );
        }
    }

    #[test]
    fn grid_frequency_encodes_int_field() {
        let mut s5i = device();
        s5i.set_frequency(1_000_000_000).unwrap();
        assert_eq!(s5i.registers().to_words()[0], 1000 << 15);
        assert_eq!(s5i.frequency(), 1_000_000_000);

        s5i.set_stepsize(10_000_000).unwrap();
        s5i.set_frequency(1_000_000_000).unwrap();
        assert_eq!(s5i.registers().to_words()[0], 100 << 15);
    }

    #[test]
    fn repeated_requests_are_bit_identical() {
        let mut a = device();
        a.set_frequency(2_400_000_000).unwrap();
        let first = a.registers().to_words();
        a.set_frequency(2_400_000_000).unwrap();
        assert_eq!(a.registers().to_words(), first);
        let frames = a.free().frames;
        assert_eq!(frames[..6], frames[6..]);
    }

    #[test]
    fn static_bits_survive_frequency_changes() {
        let mut s5i = device();
        s5i.init().unwrap();
        for &f in &[
            40_000_000u64,
            1_000_000_000,
            2_500_000_000,
            3_600_000_000,
            4_400_000_000,
        ] {
            s5i.set_frequency(f).unwrap();
            let words = s5i.registers().to_words();
            assert_eq!(words[3], (1 << 22) | (1 << 21) | 3, "R3 drifted at {}", f);
            assert_eq!(words[5], (1 << 22) | (3 << 19) | 5, "R5 drifted at {}", f);
            // static R2 bits below the R counter field
            assert_eq!(
                words[2] & 0x3FFF,
                (1 << 13) | (7 << 9) | (1 << 8) | (1 << 7) | (1 << 6) | 2
            );
            // phase/modulus words in R1
            assert_eq!(words[1] & 0x07FF_FFFF, (1 << 15) | (2 << 3) | 1);
        }
    }

    #[test]
    fn failed_plan_leaves_registers_and_bus_untouched() {
        let mut s5i = device();
        s5i.init().unwrap();
        let before = s5i.registers().to_words();

        assert_eq!(s5i.set_frequency(5_000_000_000).unwrap_err(), Error::OutOfRange);
        assert_eq!(s5i.set_frequency(1_000_500_001).unwrap_err(), Error::OffGrid);
        assert_eq!(s5i.set_stepsize(3_000_000).unwrap_err(), Error::InvalidStepsize);

        assert_eq!(s5i.registers().to_words(), before);
        assert_eq!(s5i.frequency(), 100_000_000);
        // nothing beyond the six init frames went over the bus
        assert_eq!(s5i.free().frames.len(), 6);
    }

    #[test]
    fn high_band_uses_the_8_9_prescaler() {
        let mut s5i = device();
        s5i.set_frequency(3_700_000_000).unwrap();
        let words = s5i.registers().to_words();
        assert_eq!(words[1] >> 27 & 1, 1);
        assert_eq!(words[0], 3700 << 15);
    }

    #[test]
    fn optimal_set_returns_the_snapped_frequency() {
        let mut s5i = device();
        let actual = s5i.set_frequency_optimally(1_000_000_000).unwrap();
        assert_eq!(actual, 1_000_000_000);
        assert_eq!(s5i.registers().to_words()[0], 100 << 15);

        let actual = s5i.set_frequency_optimally(1_000_000_001).unwrap();
        assert_ne!(actual, 1_000_000_001);
        assert_eq!(s5i.frequency(), actual);
    }

    #[test]
    fn output_enable_merges_one_bit() {
        let mut s5i = device();
        s5i.init().unwrap();
        let before = s5i.registers().to_words();

        s5i.enable_output(false).unwrap();
        let after = s5i.registers().to_words();
        assert_eq!(after[4], before[4] & !(1 << 5));
        assert!(!s5i.output_enabled());

        // the flag stays off across a frequency change
        s5i.set_frequency(200_000_000).unwrap();
        assert_eq!(s5i.registers().to_words()[4] & (1 << 5), 0);

        s5i.enable_output(true).unwrap();
        assert_eq!(s5i.registers().to_words()[4] & (1 << 5), 1 << 5);
    }

    #[test]
    fn output_power_merges_two_bits() {
        let mut s5i = device();
        s5i.init().unwrap();
        s5i.set_output_power(OutputLevel::Minus4dBm).unwrap();
        let words = s5i.registers().to_words();
        assert_eq!(words[4] & (3 << 3), 0);
        assert_eq!(s5i.output_level(), OutputLevel::Minus4dBm);
    }

    #[test]
    fn external_reference_changes_the_plan() {
        let mut s5i = device();
        s5i.use_external_reference(100_000_000).unwrap();
        assert_eq!(s5i.reference_source(), ReferenceSource::External);
        s5i.set_stepsize(25_000_000).unwrap();
        s5i.set_frequency(3_700_000_000).unwrap();
        let words = s5i.registers().to_words();
        assert_eq!(words[0], 148 << 15);
        assert_eq!((words[2] >> 14) & 0x3FF, 4);

        s5i.use_internal_reference();
        assert_eq!(s5i.reference_frequency(), 10_000_000);
        // the 25 MHz grid no longer divides the 10 MHz reference
        assert_eq!(
            s5i.set_frequency(3_700_000_000).unwrap_err(),
            Error::InvalidStepsize
        );
    }

    #[test]
    fn rejected_stepsize_keeps_the_old_grid() {
        let mut s5i = device();
        assert_eq!(s5i.set_stepsize(0).unwrap_err(), Error::InvalidStepsize);
        assert_eq!(s5i.set_stepsize(1_000).unwrap_err(), Error::InvalidStepsize);
        assert_eq!(s5i.stepsize(), 1_000_000);
        s5i.set_stepsize(2_000_000).unwrap();
        assert_eq!(s5i.stepsize(), 2_000_000);
    }

    #[test]
    fn bus_failure_propagates() {
        let mut s5i = S5i::new(BusSpy {
            frames: Vec::new(),
            fail: true,
        });
        assert_eq!(s5i.init().unwrap_err(), Error::Bus(()));
    }

    #[test]
    fn optimal_stepsize_matches_planner() {
        let s5i = device();
        assert_eq!(s5i.optimal_stepsize(1_000_000_000).unwrap(), 10_000_000);
    }
}
