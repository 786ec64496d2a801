mod buffer;
mod feedforward;
mod gradient;
mod network_params;
mod shared_params;
