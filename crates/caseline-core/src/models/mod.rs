pub mod outcome;
pub mod population;
pub mod response;
pub mod risk_level;
