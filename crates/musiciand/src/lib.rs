//! musiciand — announces one musician on the orchestra multicast channel.

pub mod broadcast;
