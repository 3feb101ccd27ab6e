//! A minimal Hack CPU used to execute assembler output in tests.
//!
//! Execution stops when the program counter leaves ROM or when the program
//! enters the conventional halt loop, a jump back onto the `@label` that
//! loads its own address.

const RAM_SIZE: usize = 0x8000;

pub struct Cpu {
    pub ram: Vec<i16>,
    rom: Vec<u16>,
    pc: usize,
    a: i16,
    d: i16,
    halted: bool,
}

impl Cpu {
    /// Loads a program given as binary text words.
    pub fn new<'a, I: IntoIterator<Item = &'a str>>(words: I) -> Self {
        let rom = words
            .into_iter()
            .map(|w| u16::from_str_radix(w, 2).expect("assembler emits binary words"))
            .collect();
        Cpu {
            ram: vec![0; RAM_SIZE],
            rom,
            pc: 0,
            a: 0,
            d: 0,
            halted: false,
        }
    }

    /// Runs until halted or `max_steps` instructions have executed.
    /// Returns the number of instructions executed.
    pub fn run(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && !self.halted && self.pc < self.rom.len() {
            self.step();
            steps += 1;
        }
        assert!(steps < max_steps, "program did not halt");
        steps
    }

    fn step(&mut self) {
        let word = self.rom[self.pc];
        if word & 0x8000 == 0 {
            self.a = word as i16;
            self.pc += 1;
            return;
        }

        let address = self.a as u16 as usize;
        let y = if word & 0x1000 != 0 { self.ram[address] } else { self.a };
        let out = alu(self.d, y, (word >> 6) & 0x3F);

        if word & 0x0008 != 0 {
            self.ram[address] = out;
        }
        if word & 0x0010 != 0 {
            self.d = out;
        }
        let target = address;
        if word & 0x0020 != 0 {
            self.a = out;
        }

        let jump = (word & 0x4 != 0 && out < 0)
            || (word & 0x2 != 0 && out == 0)
            || (word & 0x1 != 0 && out > 0);
        if jump {
            if target + 1 == self.pc && self.rom[target] == target as u16 {
                self.halted = true;
            }
            self.pc = target;
        } else {
            self.pc += 1;
        }
    }
}

/// The Hack ALU. `control` holds zx nx zy ny f no, most significant first.
fn alu(x: i16, y: i16, control: u16) -> i16 {
    let mut x = if control & 0b100000 != 0 { 0 } else { x };
    if control & 0b010000 != 0 {
        x = !x;
    }
    let mut y = if control & 0b001000 != 0 { 0 } else { y };
    if control & 0b000100 != 0 {
        y = !y;
    }
    let out = if control & 0b000010 != 0 { x.wrapping_add(y) } else { x & y };
    if control & 0b000001 != 0 {
        !out
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler;
    use crate::source;

    fn run(asm: &str) -> Cpu {
        let rom = assembler::assemble(source::assembly_lines(asm.lines())).unwrap();
        let mut cpu = Cpu::new(rom.iter().map(|e| e.bits.as_str()));
        cpu.run(10_000);
        cpu
    }

    #[test]
    fn test_alu() {
        assert_eq!(alu(5, 3, 0b101010), 0);
        assert_eq!(alu(5, 3, 0b111111), 1);
        assert_eq!(alu(5, 3, 0b111010), -1);
        assert_eq!(alu(5, 3, 0b000010), 8);
        assert_eq!(alu(5, 3, 0b010011), 2);
        assert_eq!(alu(5, 3, 0b000111), -2);
        assert_eq!(alu(5, 3, 0b000000), 1);
        assert_eq!(alu(5, 3, 0b010101), 7);
        assert_eq!(alu(5, 3, 0b001111), -5);
    }

    #[test]
    fn test_add_program() {
        let cpu = run("@2\nD=A\n@3\nD=D+A\n@0\nM=D");
        assert_eq!(cpu.ram[0], 5);
    }

    #[test]
    fn test_halt_loop() {
        let cpu = run("@7\nD=A\n@x\nM=D\n(END)\n@END\n0;JMP");
        assert_eq!(cpu.ram[16], 7);
        assert!(cpu.halted);
    }
}
