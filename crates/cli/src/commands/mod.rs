pub mod doctor;
pub mod onboard;
pub mod prompts;
pub mod run;
