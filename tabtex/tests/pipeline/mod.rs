mod publish;
mod themes;
