mod channel;
mod queues;
mod simulator;
