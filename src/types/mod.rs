/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that are shared by the subprotocols and exchanged over the network.

pub mod block;

pub mod crypto_primitives;

pub mod data_types;

pub mod heartbeat;

pub mod participant;
