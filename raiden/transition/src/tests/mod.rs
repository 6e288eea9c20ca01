mod factories;
mod processes;
mod transitioner;
