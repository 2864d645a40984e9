//! Device interrupt vector table
//!
//! cortex-m-rt places `__INTERRUPTS` right after the core exceptions. Only
//! the seven EXTI vectors are wired; every other line goes to
//! cortex-m-rt's `DefaultHandler`.

use pinwheel_hal_stm32f410::Vector;

type Handler = unsafe extern "C" fn();

/// Device interrupt lines on the STM32F410 (0..=97)
const INTERRUPT_COUNT: usize = 98;

extern "C" {
    fn DefaultHandler();
}

#[link_section = ".vector_table.interrupts"]
#[no_mangle]
pub static __INTERRUPTS: [Handler; INTERRUPT_COUNT] = table();

const fn table() -> [Handler; INTERRUPT_COUNT] {
    let mut table: [Handler; INTERRUPT_COUNT] = [DefaultHandler as Handler; INTERRUPT_COUNT];
    table[Vector::Exti0.irq() as usize] = exti0;
    table[Vector::Exti1.irq() as usize] = exti1;
    table[Vector::Exti2.irq() as usize] = exti2;
    table[Vector::Exti3.irq() as usize] = exti3;
    table[Vector::Exti4.irq() as usize] = exti4;
    table[Vector::Exti9_5.irq() as usize] = exti9_5;
    table[Vector::Exti15_10.irq() as usize] = exti15_10;
    table
}

extern "C" fn exti0() {
    crate::dispatch(Vector::Exti0);
}

extern "C" fn exti1() {
    crate::dispatch(Vector::Exti1);
}

extern "C" fn exti2() {
    crate::dispatch(Vector::Exti2);
}

extern "C" fn exti3() {
    crate::dispatch(Vector::Exti3);
}

extern "C" fn exti4() {
    crate::dispatch(Vector::Exti4);
}

extern "C" fn exti9_5() {
    crate::dispatch(Vector::Exti9_5);
}

extern "C" fn exti15_10() {
    crate::dispatch(Vector::Exti15_10);
}
