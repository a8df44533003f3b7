mod cli;
mod load;
