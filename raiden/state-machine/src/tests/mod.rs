mod chain;
mod factories;
mod transfer;
mod withdraw;
