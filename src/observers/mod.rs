// Consumers of solver output

pub mod imgstream;
