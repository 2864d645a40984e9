//! STM32F410 peripheral memory map
//!
//! Offsets follow RM0401 (GPIO, RCC, SYSCFG, EXTI) and PM0214 (NVIC).
//! Registers with one field per pin declare the pin 0 field only; use
//! [`nth`](super::nth) for the others.

use tock_registers::register_bitfields;

use super::{Aliased, Mmio, ReadOnly, ReadWrite, WriteOnly};

pub const GPIOA_BASE: usize = 0x4002_0000;
pub const GPIOB_BASE: usize = 0x4002_0400;
pub const GPIOC_BASE: usize = 0x4002_0800;
pub const GPIOH_BASE: usize = 0x4002_1C00;
pub const RCC_BASE: usize = 0x4002_3800;
pub const SYSCFG_BASE: usize = 0x4001_3800;
pub const EXTI_BASE: usize = 0x4001_3C00;
pub const NVIC_BASE: usize = 0xE000_E100;

register_bitfields![u32,
    pub MODER [
        MODE0 OFFSET(0) NUMBITS(2) [
            Input = 0,
            Output = 1,
            Alternate = 2,
            Analog = 3
        ]
    ],
    pub OTYPER [
        OT0 OFFSET(0) NUMBITS(1) [
            PushPull = 0,
            OpenDrain = 1
        ]
    ],
    pub OSPEEDR [
        OSPEED0 OFFSET(0) NUMBITS(2) []
    ],
    pub PUPDR [
        PUPD0 OFFSET(0) NUMBITS(2) [
            Floating = 0,
            PullUp = 1,
            PullDown = 2
        ]
    ],
    pub IDR [
        ID0 0
    ],
    pub ODR [
        OD0 0
    ],
    /// Set bits in the low half, reset bits in the high half
    pub BSRR [
        BS0 OFFSET(0) NUMBITS(1) [],
        BR0 OFFSET(16) NUMBITS(1) []
    ],
    /// AFRL covers pins 0-7, AFRH pins 8-15
    pub AFR [
        AFSEL0 OFFSET(0) NUMBITS(4) []
    ],
    pub AHB1ENR [
        GPIOAEN 0,
        GPIOBEN 1,
        GPIOCEN 2,
        GPIOHEN 7,
        CRCEN 12,
        DMA1EN 21,
        DMA2EN 22
    ],
    pub APB2ENR [
        TIM1EN 0,
        USART1EN 4,
        USART6EN 5,
        ADC1EN 8,
        SPI1EN 12,
        SYSCFGEN 14,
        TIM9EN 16,
        TIM11EN 18,
        SPI5EN 20
    ],
    /// Port selection for four EXTI lines per register
    pub EXTICR [
        EXTI0 OFFSET(0) NUMBITS(4) [
            PA = 0,
            PB = 1,
            PC = 2,
            PH = 7
        ]
    ],
    /// One bit per EXTI line: IMR, EMR, RTSR, FTSR, SWIER
    pub LINES [
        LINE0 0
    ],
    /// EXTI pending flags as read
    pub PR [
        PR0 0
    ],
    /// EXTI pending flags as written: a 1 clears the line
    pub PR_CLEAR [
        PR0 0
    ],
    /// NVIC enable or pending state as read, one bit per IRQ
    pub NVIC_STATE [
        IRQ0 0
    ],
    /// ISER/ISPR as written: a 1 sets the IRQ's bit
    pub NVIC_SET [
        IRQ0 0
    ],
    /// ICER/ICPR as written: a 1 clears the IRQ's bit
    pub NVIC_CLEAR [
        IRQ0 0
    ]
];

register_bitfields![u8,
    /// The STM32F4 implements the top four priority bits only
    pub IPR [
        PRIORITY OFFSET(4) NUMBITS(4) []
    ]
];

/// Declare a register block bound to a bus, one accessor per register
macro_rules! register_block {
    (
        $(#[$attr:meta])*
        $block:ident {
            $(
                $(#[$reg_attr:meta])*
                ($offset:literal => $reg:ident: $kind:ident<$word:ty $(, $long:path)*>)
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        pub struct $block<'a, B: Mmio + ?Sized> {
            bus: &'a B,
            base: usize,
        }

        impl<'a, B: Mmio + ?Sized> $block<'a, B> {
            pub const fn new(bus: &'a B, base: usize) -> Self {
                Self { bus, base }
            }

            $(
                $(#[$reg_attr])*
                pub const fn $reg(&self) -> $kind<'a, B, $word $(, $long)*> {
                    $kind::at(self.bus, self.base + $offset)
                }
            )*
        }
    };
}

register_block! {
    /// GPIO port register block
    GpioRegisters {
        (0x00 => moder: ReadWrite<u32, MODER::Register>),
        (0x04 => otyper: ReadWrite<u32, OTYPER::Register>),
        (0x08 => ospeedr: ReadWrite<u32, OSPEEDR::Register>),
        (0x0C => pupdr: ReadWrite<u32, PUPDR::Register>),
        (0x10 => idr: ReadOnly<u32, IDR::Register>),
        (0x14 => odr: ReadWrite<u32, ODR::Register>),
        (0x18 => bsrr: WriteOnly<u32, BSRR::Register>),
        /// Configuration lock
        (0x1C => lckr: ReadWrite<u32>),
        /// Alternate function, pins 0-7
        (0x20 => afrl: ReadWrite<u32, AFR::Register>),
        /// Alternate function, pins 8-15
        (0x24 => afrh: ReadWrite<u32, AFR::Register>),
    }
}

impl<'a, B: Mmio + ?Sized> GpioRegisters<'a, B> {
    /// AFRL for pins 0-7, AFRH for pins 8-15
    pub const fn afr(&self, pin: u8) -> ReadWrite<'a, B, u32, AFR::Register> {
        if pin < 8 {
            self.afrl()
        } else {
            self.afrh()
        }
    }
}

register_block! {
    /// Reset and clock control
    Rcc {
        (0x00 => cr: ReadWrite<u32>),
        (0x04 => pllcfgr: ReadWrite<u32>),
        (0x08 => cfgr: ReadWrite<u32>),
        (0x0C => cir: ReadWrite<u32>),
        (0x10 => ahb1rstr: ReadWrite<u32>),
        (0x20 => apb1rstr: ReadWrite<u32>),
        (0x24 => apb2rstr: ReadWrite<u32>),
        (0x30 => ahb1enr: ReadWrite<u32, AHB1ENR::Register>),
        (0x40 => apb1enr: ReadWrite<u32>),
        (0x44 => apb2enr: ReadWrite<u32, APB2ENR::Register>),
        (0x50 => ahb1lpenr: ReadWrite<u32>),
        (0x60 => apb1lpenr: ReadWrite<u32>),
        (0x64 => apb2lpenr: ReadWrite<u32>),
        (0x70 => bdcr: ReadWrite<u32>),
        (0x74 => csr: ReadWrite<u32>),
        (0x80 => sscgr: ReadWrite<u32>),
        (0x8C => dckcfgr: ReadWrite<u32>),
        (0x94 => dckcfgr2: ReadWrite<u32>),
    }
}

register_block! {
    /// System configuration controller
    Syscfg {
        (0x00 => memrmp: ReadWrite<u32>),
        (0x04 => pmc: ReadWrite<u32>),
        (0x1C => cfgr2: ReadWrite<u32>),
        (0x20 => cmpcr: ReadWrite<u32>),
        (0x2C => cfgr: ReadWrite<u32>),
    }
}

impl<'a, B: Mmio + ?Sized> Syscfg<'a, B> {
    /// EXTICR1..4 for `index` 0..=3
    pub const fn exticr(&self, index: u8) -> ReadWrite<'a, B, u32, EXTICR::Register> {
        ReadWrite::at(self.bus, self.base + 0x08 + 4 * (index as usize & 0b11))
    }
}

register_block! {
    /// External interrupt/event controller
    Exti {
        (0x00 => imr: ReadWrite<u32, LINES::Register>),
        (0x04 => emr: ReadWrite<u32, LINES::Register>),
        (0x08 => rtsr: ReadWrite<u32, LINES::Register>),
        (0x0C => ftsr: ReadWrite<u32, LINES::Register>),
        (0x10 => swier: ReadWrite<u32, LINES::Register>),
        (0x14 => pr: Aliased<u32, PR::Register, PR_CLEAR::Register>),
    }
}

register_block! {
    /// Nested vectored interrupt controller
    Nvic {}
}

impl<'a, B: Mmio + ?Sized> Nvic<'a, B> {
    /// Set-enable bank for IRQs `32 * bank ..`
    pub const fn iser(&self, bank: u8) -> Aliased<'a, B, u32, NVIC_STATE::Register, NVIC_SET::Register> {
        Aliased::at(self.bus, self.base + 4 * Self::bank(bank))
    }

    /// Clear-enable bank
    pub const fn icer(&self, bank: u8) -> Aliased<'a, B, u32, NVIC_STATE::Register, NVIC_CLEAR::Register> {
        Aliased::at(self.bus, self.base + 0x080 + 4 * Self::bank(bank))
    }

    /// Set-pending bank
    pub const fn ispr(&self, bank: u8) -> Aliased<'a, B, u32, NVIC_STATE::Register, NVIC_SET::Register> {
        Aliased::at(self.bus, self.base + 0x100 + 4 * Self::bank(bank))
    }

    /// Clear-pending bank
    pub const fn icpr(&self, bank: u8) -> Aliased<'a, B, u32, NVIC_STATE::Register, NVIC_CLEAR::Register> {
        Aliased::at(self.bus, self.base + 0x180 + 4 * Self::bank(bank))
    }

    /// Active bit bank
    pub const fn iabr(&self, bank: u8) -> ReadOnly<'a, B, u32, NVIC_STATE::Register> {
        ReadOnly::at(self.bus, self.base + 0x200 + 4 * Self::bank(bank))
    }

    /// Priority byte of `irq`
    pub const fn ipr(&self, irq: u16) -> ReadWrite<'a, B, u8, IPR::Register> {
        ReadWrite::at(self.bus, self.base + 0x300 + irq as usize)
    }

    const fn bank(bank: u8) -> usize {
        (bank & 0b111) as usize
    }
}

pub const fn rcc<B: Mmio + ?Sized>(bus: &B) -> Rcc<'_, B> {
    Rcc::new(bus, RCC_BASE)
}

pub const fn syscfg<B: Mmio + ?Sized>(bus: &B) -> Syscfg<'_, B> {
    Syscfg::new(bus, SYSCFG_BASE)
}

pub const fn exti<B: Mmio + ?Sized>(bus: &B) -> Exti<'_, B> {
    Exti::new(bus, EXTI_BASE)
}

pub const fn nvic<B: Mmio + ?Sized>(bus: &B) -> Nvic<'_, B> {
    Nvic::new(bus, NVIC_BASE)
}
