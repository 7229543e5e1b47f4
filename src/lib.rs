//! Interactive orthographic globe of bombing missions: country outlines
//! coloured by allegiance, takeoff bases, targets and the great-circle flight
//! paths between them, drawn in Braille on the terminal.

pub mod braille;
pub mod config;
pub mod data;
pub mod geo;
pub mod globe;
pub mod map;
pub mod tooltip;
