pub mod format;
mod ring_buffer;

pub use format::{
    DateTime, days_in_month, format_calendar, format_date_iso, format_date_long,
    format_date_short, format_duration, format_size, is_leap_year,
};
pub use ring_buffer::RingBuffer;
